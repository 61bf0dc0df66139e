use std::sync::Arc;
use strelix_config::Config;
use strelix_providers::ProviderCatalog;
use tracing::debug;

use crate::bridge::SyncBridge;
use crate::continue_watching::{ContinueWatchingItem, ContinueWatchingSelector};
use crate::progress::ProgressStore;
use crate::registry::ProviderRegistry;
use crate::storage::KeyValueStorage;
use crate::watchlist::WatchlistStore;

/// All watch-state components wired to one storage backend.
pub struct WatchState {
    storage: Arc<dyn KeyValueStorage>,
    registry: ProviderRegistry,
    progress: ProgressStore,
    watchlist: WatchlistStore,
    selector: ContinueWatchingSelector,
    config: Config,
}

impl WatchState {
    pub fn new(config: &Config, storage: Arc<dyn KeyValueStorage>) -> Self {
        let keys = &config.storage;
        let registry = ProviderRegistry::new(
            ProviderCatalog::builtin(&config.providers),
            storage.clone(),
            keys.preferred_provider_key.clone(),
        );
        let progress = ProgressStore::new(storage.clone(), keys.progress_key.clone());
        let watchlist = WatchlistStore::new(storage.clone(), keys.watchlist_key.clone());
        let selector = ContinueWatchingSelector::from_config(&config.continue_watching);

        debug!(
            "Watch state ready (progress='{}', watchlist='{}', preference='{}')",
            keys.progress_key, keys.watchlist_key, keys.preferred_provider_key
        );

        Self {
            storage,
            registry,
            progress,
            watchlist,
            selector,
            config: config.clone(),
        }
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStorage> {
        &self.storage
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn watchlist(&self) -> &WatchlistStore {
        &self.watchlist
    }

    pub fn selector(&self) -> ContinueWatchingSelector {
        self.selector
    }

    /// A new, detached bridge for the configured player
    pub fn bridge(&self) -> SyncBridge {
        SyncBridge::new(self.progress.clone(), self.selector, &self.config.player)
    }

    pub fn continue_watching(&self) -> Vec<ContinueWatchingItem> {
        self.selector.select(&self.progress.get_all())
    }
}
