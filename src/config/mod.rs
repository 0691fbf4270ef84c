use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::history::{MAX_BUSY_TIMEOUT, MAX_RETRIES, StoreOptions};
use crate::ranking::DecayPolicy;
use crate::recorder::ExtensionClassifier;

/// Where the store lives and whether output may be styled.
///
/// Built once by the binary and handed to every component that needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub color_enabled: bool,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>, color_enabled: bool) -> Self {
        Self {
            path: path.into(),
            color_enabled,
        }
    }

    /// Use `explicit` when given, else the default store location.
    ///
    /// # Errors
    /// `Config` when no explicit path is given and no home directory can be found.
    pub fn resolve(explicit: Option<PathBuf>, color_enabled: bool) -> Result<Self> {
        let path = explicit
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(crate::paths::default_db_path)
            .ok_or_else(|| {
                Error::Config("cannot determine a home directory; pass --db-path".to_owned())
            })?;
        Ok(Self::new(path, color_enabled))
    }
}

/// Tunables read from `config.toml`. Every section and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ranking: RankingSection,
    pub store: StoreSection,
    pub selector: SelectorSection,
    /// Extra extension mappings, e.g. `image = ["png", "jpg"]`.
    pub categories: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RankingSection {
    pub half_life_hours: f64,
    pub floor: f64,
}

impl Default for RankingSection {
    fn default() -> Self {
        let policy = DecayPolicy::default();
        Self {
            half_life_hours: policy.half_life().as_secs_f64() / 3600.0,
            floor: policy.floor(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub busy_timeout_ms: u64,
    pub max_retries: u32,
}

impl Default for StoreSection {
    fn default() -> Self {
        let options = StoreOptions::default();
        Self {
            busy_timeout_ms: u64::try_from(options.busy_timeout.as_millis()).unwrap_or(u64::MAX),
            max_retries: options.max_retries,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SelectorSection {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for SelectorSection {
    fn default() -> Self {
        Self {
            command: "fzf".to_owned(),
            args: vec!["--height=40%".to_owned()],
        }
    }
}

impl Settings {
    /// Load from the user config file, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(crate::paths::config_file().as_deref())
    }

    /// Load from an explicit file. A missing file yields defaults silently;
    /// an unreadable or invalid one yields defaults with a warning.
    pub fn load_from(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), "cannot read config, using defaults: {e}");
                return Self::default();
            }
        };
        match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), "invalid config, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// # Errors
    /// `Config` if the configured half-life or floor is out of range.
    pub fn decay_policy(&self) -> Result<DecayPolicy> {
        DecayPolicy::from_hours(self.ranking.half_life_hours, self.ranking.floor)
    }

    /// Store tunables, clamped to what the store can honor.
    pub fn store_options(&self) -> StoreOptions {
        let busy_timeout = Duration::from_millis(self.store.busy_timeout_ms);
        if busy_timeout > MAX_BUSY_TIMEOUT {
            tracing::warn!(
                busy_timeout_ms = self.store.busy_timeout_ms,
                "busy_timeout_ms too large, using {}",
                MAX_BUSY_TIMEOUT.as_millis()
            );
        }
        if self.store.max_retries > MAX_RETRIES {
            tracing::warn!(
                max_retries = self.store.max_retries,
                "max_retries too large, using {MAX_RETRIES}"
            );
        }
        StoreOptions {
            busy_timeout: busy_timeout.min(MAX_BUSY_TIMEOUT),
            max_retries: self.store.max_retries.min(MAX_RETRIES),
        }
    }

    /// Built-in audio/video table plus the configured categories.
    pub fn classifier(&self) -> ExtensionClassifier {
        self.categories
            .iter()
            .fold(ExtensionClassifier::default(), |c, (category, exts)| {
                c.with_category(category, exts.as_slice())
            })
    }
}

#[cfg(test)]
mod tests;
