use std::path::PathBuf;

use anyhow::Context as _;

use magnolia::config::{Settings, StoreConfig};
use magnolia::history::HistoryStore;
use magnolia::query::Dispatcher;

/// Everything one invocation needs: resolved settings and an open store.
pub struct Session {
    pub store: HistoryStore,
    pub config: StoreConfig,
    pub settings: Settings,
}

impl Session {
    pub fn open(db_path: Option<PathBuf>, color_enabled: bool) -> anyhow::Result<Self> {
        let settings = Settings::load();
        let config = StoreConfig::resolve(db_path, color_enabled)?;
        tracing::debug!(path = %config.path.display(), "opening history store");
        let store = HistoryStore::open(&config.path, &settings.store_options())
            .context("cannot open history")?;
        Ok(Self {
            store,
            config,
            settings,
        })
    }

    pub fn dispatcher(&self) -> anyhow::Result<Dispatcher<'_>> {
        let policy = self
            .settings
            .decay_policy()
            .context("invalid [ranking] settings")?;
        Ok(Dispatcher::new(&self.store, &self.config, policy))
    }
}
