//! Centralised magnolia user-path resolution.
//!
//! Priority for the user-level base directory:
//!   1. `MAGNOLIA_HOME` env var (if set and non-empty)
//!   2. `dirs::config_dir().map(|d| d.join("magnolia"))` (platform default)
//!
//! The history database has its own fallback so existing installs keep
//! working:
//!   1. `--db-path` / `MAGNOLIA_DB_PATH` (handled by the CLI)
//!   2. `$MAGNOLIA_HOME/magnolia.db`
//!   3. `~/.magnolia.db`

use std::path::PathBuf;

pub const HOME_ENV: &str = "MAGNOLIA_HOME";
const DB_FILE_NAME: &str = "magnolia.db";
const LEGACY_DB_FILE_NAME: &str = ".magnolia.db";
const CONFIG_FILE_NAME: &str = "config.toml";

fn magnolia_home() -> Option<PathBuf> {
    if let Ok(home) = std::env::var(HOME_ENV)
        && !home.is_empty()
    {
        return Some(PathBuf::from(home));
    }
    None
}

/// Returns the magnolia user-level base directory.
pub fn user_dir() -> Option<PathBuf> {
    magnolia_home().or_else(|| dirs::config_dir().map(|d| d.join("magnolia")))
}

/// Path of the optional `config.toml`.
pub fn config_file() -> Option<PathBuf> {
    user_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

/// Default history database location when no explicit path was given.
pub fn default_db_path() -> Option<PathBuf> {
    magnolia_home()
        .map(|d| d.join(DB_FILE_NAME))
        .or_else(|| dirs::home_dir().map(|h| h.join(LEGACY_DB_FILE_NAME)))
}
