use strelix_models::{EpisodeKey, MediaIdentity, MediaKind};

/// A third-party embedding service that plays a title from its catalog id.
///
/// Implementations only build URLs; nothing here talks to the network, and the
/// service being up is never checked.
pub trait VideoProvider: Send + Sync {
    /// Stable id, persisted as the user's preference
    fn id(&self) -> &str;

    fn display_name(&self) -> &str;

    fn movie_url(&self, tmdb_id: u64) -> String;

    fn episode_url(&self, tmdb_id: u64, season: u32, episode: u32) -> String;
}

/// Build the embed URL for a title.
///
/// Series without an explicit season/episode start at season 1, episode 1.
pub fn resolve_playback_url(
    provider: &dyn VideoProvider,
    identity: MediaIdentity,
    season: Option<u32>,
    episode: Option<u32>,
) -> String {
    match identity.kind {
        MediaKind::Movie => provider.movie_url(identity.id),
        MediaKind::Series => {
            let default = EpisodeKey::default();
            provider.episode_url(
                identity.id,
                season.unwrap_or(default.season),
                episode.unwrap_or(default.episode),
            )
        }
    }
}
