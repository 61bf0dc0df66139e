use std::sync::Arc;
use strelix_models::MediaIdentity;
use strelix_providers::{resolve_playback_url, ProviderCatalog, VideoProvider};
use tracing::{debug, info, warn};

use crate::storage::{KeyValueStorage, StorageError};

/// The provider catalog plus the user's persisted provider choice.
pub struct ProviderRegistry {
    catalog: ProviderCatalog,
    storage: Arc<dyn KeyValueStorage>,
    preference_key: String,
}

impl ProviderRegistry {
    pub fn new(
        catalog: ProviderCatalog,
        storage: Arc<dyn KeyValueStorage>,
        preference_key: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            storage,
            preference_key: preference_key.into(),
        }
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    /// Providers in display order
    pub fn list_providers(&self) -> impl Iterator<Item = &dyn VideoProvider> {
        self.catalog.providers()
    }

    /// The raw stored preference, if any. It may name a provider that no longer exists.
    pub fn selected_id(&self) -> Option<String> {
        match self.storage.get(&self.preference_key) {
            Ok(value) => value.filter(|id| !id.is_empty()),
            Err(e) => {
                warn!("Failed to read preferred provider: {}", e);
                None
            }
        }
    }

    /// The preferred provider, or the first one when unset or unknown.
    pub fn get_selected(&self) -> &dyn VideoProvider {
        let stored = self.selected_id();
        if let Some(id) = stored.as_deref() {
            if !self.catalog.contains(id) {
                debug!("Preferred provider '{}' is unknown, using the default", id);
            }
        }
        self.catalog.get_or_default(stored.as_deref())
    }

    /// Persist `id` as the preferred provider. Unknown ids are stored as given.
    pub fn set_selected(&self, id: &str) -> Result<(), StorageError> {
        if !self.catalog.contains(id) {
            warn!(
                "Storing unknown provider '{}' as preferred; '{}' will be used instead",
                id,
                self.catalog.default_provider().id()
            );
        }
        self.storage.set(&self.preference_key, id)?;
        info!("Preferred provider set to '{}'", id);
        Ok(())
    }

    /// Forget the preferred provider; the first provider is used again.
    pub fn clear_selected(&self) -> Result<(), StorageError> {
        self.storage.remove(&self.preference_key)?;
        info!("Cleared preferred provider");
        Ok(())
    }

    pub fn resolve_playback_url(
        &self,
        provider: &dyn VideoProvider,
        identity: MediaIdentity,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> String {
        resolve_playback_url(provider, identity, season, episode)
    }

    /// Playback URL through the preferred provider
    pub fn resolve_selected_url(
        &self,
        identity: MediaIdentity,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> String {
        resolve_playback_url(self.get_selected(), identity, season, episode)
    }
}
