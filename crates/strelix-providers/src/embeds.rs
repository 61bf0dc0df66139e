// Fallback embed services. None of them report progress back to the host.

use crate::traits::VideoProvider;

#[derive(Debug, Default, Clone, Copy)]
pub struct VidSrcProvider;

impl VideoProvider for VidSrcProvider {
    fn id(&self) -> &str {
        "vidsrc"
    }

    fn display_name(&self) -> &str {
        "VidSrc"
    }

    fn movie_url(&self, tmdb_id: u64) -> String {
        format!("https://vidsrc.xyz/embed/movie/{}", tmdb_id)
    }

    fn episode_url(&self, tmdb_id: u64, season: u32, episode: u32) -> String {
        format!("https://vidsrc.xyz/embed/tv/{}/{}/{}", tmdb_id, season, episode)
    }
}

/// 2embed.cc
#[derive(Debug, Default, Clone, Copy)]
pub struct TwoEmbedProvider;

impl VideoProvider for TwoEmbedProvider {
    fn id(&self) -> &str {
        "embed"
    }

    fn display_name(&self) -> &str {
        "Embed"
    }

    fn movie_url(&self, tmdb_id: u64) -> String {
        format!("https://www.2embed.cc/embed/{}", tmdb_id)
    }

    // No '?' before the season/episode params.
    fn episode_url(&self, tmdb_id: u64, season: u32, episode: u32) -> String {
        format!("https://www.2embed.cc/embedtv/{}&s={}&e={}", tmdb_id, season, episode)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MultiEmbedProvider;

impl VideoProvider for MultiEmbedProvider {
    fn id(&self) -> &str {
        "multiembed"
    }

    fn display_name(&self) -> &str {
        "MultiEmbed"
    }

    fn movie_url(&self, tmdb_id: u64) -> String {
        format!("https://multiembed.mov/?video_id={}&tmdb=1", tmdb_id)
    }

    fn episode_url(&self, tmdb_id: u64, season: u32, episode: u32) -> String {
        format!(
            "https://multiembed.mov/?video_id={}&tmdb=1&s={}&e={}",
            tmdb_id, season, episode
        )
    }
}
