use std::sync::Arc;

use crate::config::Config;
use crate::listing::catalog::LocationDirectory;
use crate::store::RecordStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub config: Arc<Config>,
    pub directory: Arc<LocationDirectory>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, config: Config, directory: LocationDirectory) -> Self {
        AppState {
            store,
            config: Arc::new(config),
            directory: Arc::new(directory),
        }
    }

    pub fn map_token(&self) -> Option<&str> {
        self.config.map_api_token.as_deref()
    }
}

#[cfg(test)]
impl AppState {
    /// Memory store, embedded catalog, cache off.
    pub fn for_tests() -> Self {
        use crate::listing::catalog::Catalog;
        use crate::store::memory::MemoryRecordStore;

        let config = Config::for_tests();
        let directory = LocationDirectory::new(
            Catalog::embedded().expect("embedded catalog"),
            std::time::Duration::ZERO,
        );
        AppState::new(Arc::new(MemoryRecordStore::default()), config, directory)
    }
}
