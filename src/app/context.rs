use std::path::Path;

use crate::app::error::Result;
use crate::config::Config;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::store::SqliteStore;

/// Everything a command needs: the store, an HTTP fetcher and the session.
///
/// Handlers receive it by `&mut` so that `login`/`register` can change the
/// session; persisting it is left to the caller.
pub struct AppContext {
    pub store: SqliteStore,
    pub fetcher: Box<dyn Fetcher + Send + Sync>,
    pub config: Config,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = Path::new(&config.db_url);
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let store = SqliteStore::new(&config.db_url)?;
        let fetcher = Box::new(HttpFetcher::new()?);

        Ok(Self {
            store,
            fetcher,
            config,
        })
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = SqliteStore::in_memory()?;
        let fetcher = Box::new(HttpFetcher::new()?);

        Ok(Self {
            store,
            fetcher,
            config,
        })
    }

    pub fn with_fetcher(mut self, fetcher: Box<dyn Fetcher + Send + Sync>) -> Self {
        self.fetcher = fetcher;
        self
    }
}
