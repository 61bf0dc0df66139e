//! Ordered catalog of video providers.
//!
//! Insertion order is display and priority order; the first entry is the fallback
//! whenever a stored preference names a provider that does not exist.

use std::collections::HashSet;
use strelix_config::ProvidersConfig;
use tracing::debug;

use crate::embeds::{MultiEmbedProvider, TwoEmbedProvider, VidSrcProvider};
use crate::error::ProviderError;
use crate::traits::VideoProvider;
use crate::vidlink::VidLinkProvider;

pub struct ProviderCatalog {
    providers: Vec<Box<dyn VideoProvider>>,
}

impl ProviderCatalog {
    /// Build a catalog from an explicit provider list.
    ///
    /// Fails if the list is empty or two providers share an id, so `default_provider`
    /// and id lookups are always well defined.
    pub fn new(providers: Vec<Box<dyn VideoProvider>>) -> Result<Self, ProviderError> {
        if providers.is_empty() {
            return Err(ProviderError::EmptyCatalog);
        }

        let mut seen = HashSet::new();
        for provider in &providers {
            if !seen.insert(provider.id().to_string()) {
                return Err(ProviderError::DuplicateId(provider.id().to_string()));
            }
        }

        Ok(Self { providers })
    }

    /// The built-in providers: VidLink, VidSrc, 2embed, MultiEmbed
    pub fn builtin(config: &ProvidersConfig) -> Self {
        let providers: Vec<Box<dyn VideoProvider>> = vec![
            Box::new(VidLinkProvider::new(&config.vidlink)),
            Box::new(VidSrcProvider),
            Box::new(TwoEmbedProvider),
            Box::new(MultiEmbedProvider),
        ];
        debug!("Registered {} built-in video providers", providers.len());
        Self { providers }
    }

    pub fn providers(&self) -> impl Iterator<Item = &dyn VideoProvider> {
        self.providers.iter().map(|p| p.as_ref())
    }

    pub fn ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&dyn VideoProvider> {
        self.providers
            .iter()
            .find(|p| p.id() == id)
            .map(|p| p.as_ref())
    }

    pub fn require(&self, id: &str) -> Result<&dyn VideoProvider, ProviderError> {
        self.get(id)
            .ok_or_else(|| ProviderError::UnknownProvider(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// First provider in the catalog
    pub fn default_provider(&self) -> &dyn VideoProvider {
        self.providers[0].as_ref()
    }

    /// Look up `id`, falling back to the default provider when it is missing or unknown
    pub fn get_or_default(&self, id: Option<&str>) -> &dyn VideoProvider {
        id.and_then(|id| self.get(id))
            .unwrap_or_else(|| self.default_provider())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for ProviderCatalog {
    fn default() -> Self {
        Self::builtin(&ProvidersConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::resolve_playback_url;
    use strelix_models::MediaIdentity;

    #[test]
    fn test_builtin_order() {
        let catalog = ProviderCatalog::default();
        assert_eq!(catalog.ids(), vec!["vidlink", "vidsrc", "embed", "multiembed"]);
        assert_eq!(catalog.default_provider().id(), "vidlink");
        assert_eq!(catalog.get("embed").unwrap().display_name(), "Embed");
    }

    #[test]
    fn test_get_or_default_falls_back() {
        let catalog = ProviderCatalog::default();
        assert_eq!(catalog.get_or_default(Some("vidsrc")).id(), "vidsrc");
        assert_eq!(catalog.get_or_default(Some("gone-provider")).id(), "vidlink");
        assert_eq!(catalog.get_or_default(None).id(), "vidlink");
        assert_eq!(
            catalog.require("gone-provider").err(),
            Some(ProviderError::UnknownProvider("gone-provider".to_string()))
        );
    }

    #[test]
    fn test_new_rejects_empty_and_duplicates() {
        assert_eq!(ProviderCatalog::new(Vec::new()).err(), Some(ProviderError::EmptyCatalog));

        let dupes: Vec<Box<dyn VideoProvider>> = vec![Box::new(VidSrcProvider), Box::new(VidSrcProvider)];
        assert_eq!(
            ProviderCatalog::new(dupes).err(),
            Some(ProviderError::DuplicateId("vidsrc".to_string()))
        );
    }

    #[test]
    fn test_resolve_movie_and_series() {
        let catalog = ProviderCatalog::default();
        let vidsrc = catalog.get("vidsrc").unwrap();

        assert_eq!(
            resolve_playback_url(vidsrc, MediaIdentity::movie(550), Some(3), Some(4)),
            "https://vidsrc.xyz/embed/movie/550"
        );
        assert_eq!(
            resolve_playback_url(vidsrc, MediaIdentity::series(1399), Some(3), Some(4)),
            "https://vidsrc.xyz/embed/tv/1399/3/4"
        );
    }

    #[test]
    fn test_resolve_series_defaults_to_first_episode() {
        let catalog = ProviderCatalog::default();
        for provider in catalog.providers() {
            let defaulted = resolve_playback_url(provider, MediaIdentity::series(1399), None, None);
            assert_eq!(defaulted, provider.episode_url(1399, 1, 1));
        }

        let multi = catalog.get("multiembed").unwrap();
        assert_eq!(
            resolve_playback_url(multi, MediaIdentity::series(1399), Some(2), None),
            "https://multiembed.mov/?video_id=1399&tmdb=1&s=2&e=1"
        );
    }
}
