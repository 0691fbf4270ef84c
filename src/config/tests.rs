#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use super::*;
use crate::history::FileType;
use crate::recorder::Classify as _;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, content).unwrap();
    path
}

// --- StoreConfig ---

#[test]
fn explicit_store_path_wins() {
    let cfg = StoreConfig::resolve(Some(PathBuf::from("/tmp/custom.db")), false).unwrap();
    assert_eq!(cfg.path, PathBuf::from("/tmp/custom.db"));
    assert!(!cfg.color_enabled);
}

#[test]
fn empty_explicit_path_is_ignored() {
    let cfg = StoreConfig::resolve(Some(PathBuf::new()), true);
    if let Ok(cfg) = cfg {
        assert_ne!(cfg.path, PathBuf::new());
        assert!(cfg.color_enabled);
    }
}

// --- Settings::load_from ---

#[test]
fn missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::load_from(Some(&dir.path().join("absent.toml")));
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.selector.command, "fzf");
    assert_eq!(settings.store.max_retries, 5);
}

#[test]
fn no_path_gives_defaults() {
    assert_eq!(Settings::load_from(None), Settings::default());
}

#[test]
fn partial_file_keeps_other_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[ranking]\nhalf_life_hours = 12.0\n");
    let settings = Settings::load_from(Some(&path));

    assert_eq!(settings.ranking.half_life_hours, 12.0);
    assert_eq!(settings.ranking.floor, DecayPolicy::default().floor());
    assert_eq!(settings.store, StoreSection::default());
    let policy = settings.decay_policy().unwrap();
    assert_eq!(policy.half_life(), Duration::from_secs(12 * 3600));
}

#[test]
fn invalid_toml_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[ranking\nhalf_life_hours = ");
    assert_eq!(Settings::load_from(Some(&path)), Settings::default());
}

#[test]
fn out_of_range_floor_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[ranking]\nfloor = 2.0\n");
    let err = Settings::load_from(Some(&path)).decay_policy().unwrap_err();
    assert!(matches!(err, Error::Config(_)), "got {err:?}");
}

#[test]
fn huge_half_life_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[ranking]\nhalf_life_hours = 1e300\n");
    let err = Settings::load_from(Some(&path)).decay_policy().unwrap_err();
    assert!(matches!(err, Error::Config(_)), "got {err:?}");
}

#[test]
fn store_and_selector_sections_are_read() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "[store]\nbusy_timeout_ms = 250\nmax_retries = 1\n\n\
         [selector]\ncommand = \"sk\"\nargs = [\"--reverse\"]\n",
    );
    let settings = Settings::load_from(Some(&path));

    let options = settings.store_options();
    assert_eq!(options.busy_timeout, Duration::from_millis(250));
    assert_eq!(options.max_retries, 1);
    assert_eq!(settings.selector.command, "sk");
    assert_eq!(settings.selector.args, vec!["--reverse"]);
}

#[test]
fn oversized_store_settings_are_clamped() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "[store]\nbusy_timeout_ms = 3000000000\nmax_retries = 4294967295\n",
    );
    let options = Settings::load_from(Some(&path)).store_options();
    assert_eq!(options.busy_timeout, MAX_BUSY_TIMEOUT);
    assert_eq!(options.max_retries, MAX_RETRIES);
}

#[test]
fn categories_extend_the_classifier() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[categories]\nimage = [\"png\", \"jpg\"]\n");
    let classifier = Settings::load_from(Some(&path)).classifier();

    assert_eq!(classifier.classify(Path::new("/a.PNG")), FileType::new("image"));
    assert_eq!(classifier.classify(Path::new("/a.mp3")), FileType::audio());
    assert_eq!(classifier.classify(Path::new("/a.txt")), FileType::other());
}
