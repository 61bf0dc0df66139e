use strelix_config::VidLinkConfig;

use crate::traits::VideoProvider;

const VIDLINK_BASE: &str = "https://vidlink.pro";

/// Audio track for anime embeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimeAudio {
    #[default]
    Sub,
    Dub,
}

impl AnimeAudio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimeAudio::Sub => "sub",
            AnimeAudio::Dub => "dub",
        }
    }
}

/// VidLink is the player that reports progress back to the host, so it is listed first.
pub struct VidLinkProvider {
    query: String,
}

impl VidLinkProvider {
    pub fn new(options: &VidLinkConfig) -> Self {
        Self {
            query: build_query(options),
        }
    }

    /// Anime embeds are keyed by MyAnimeList id rather than TMDB id.
    ///
    /// `fallback` asks VidLink to try other sources when the preferred audio is missing.
    pub fn anime_url(&self, mal_id: u64, episode: u32, audio: AnimeAudio, fallback: bool) -> String {
        let mut url = self.with_query(format!(
            "{}/anime/{}/{}/{}",
            VIDLINK_BASE,
            mal_id,
            episode,
            audio.as_str()
        ));
        if fallback {
            url.push_str(if self.query.is_empty() { "?" } else { "&" });
            url.push_str("fallback=true");
        }
        url
    }

    fn with_query(&self, path: String) -> String {
        if self.query.is_empty() {
            path
        } else {
            format!("{}?{}", path, self.query)
        }
    }
}

impl Default for VidLinkProvider {
    fn default() -> Self {
        Self::new(&VidLinkConfig::default())
    }
}

impl VideoProvider for VidLinkProvider {
    fn id(&self) -> &str {
        "vidlink"
    }

    fn display_name(&self) -> &str {
        "VidLink"
    }

    fn movie_url(&self, tmdb_id: u64) -> String {
        self.with_query(format!("{}/movie/{}", VIDLINK_BASE, tmdb_id))
    }

    fn episode_url(&self, tmdb_id: u64, season: u32, episode: u32) -> String {
        self.with_query(format!("{}/tv/{}/{}/{}", VIDLINK_BASE, tmdb_id, season, episode))
    }
}

/// Render player options in VidLink's parameter order, skipping unset or empty values
fn build_query(options: &VidLinkConfig) -> String {
    let text = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    let flag = |value: Option<bool>| value.map(|v| v.to_string());

    let params: [(&str, Option<String>); 9] = [
        ("primaryColor", text(&options.primary_color)),
        ("secondaryColor", text(&options.secondary_color)),
        ("iconColor", text(&options.icon_color)),
        ("icons", options.icons.map(|i| i.as_str().to_string())),
        ("title", flag(options.title)),
        ("poster", flag(options.poster)),
        ("autoplay", flag(options.autoplay)),
        ("nextbutton", flag(options.next_button)),
        ("player", options.player.map(|p| p.as_str().to_string())),
    ];

    params
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_ref()
                .map(|v| format!("{}={}", key, urlencoding::encode(v)))
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use strelix_config::{VidLinkIcons, VidLinkPlayer};

    const DEFAULT_QUERY: &str = "primaryColor=ffffff&secondaryColor=4a4a4a&iconColor=ffffff&autoplay=true";

    #[test]
    fn test_default_urls() {
        let provider = VidLinkProvider::default();
        assert_eq!(
            provider.movie_url(786892),
            format!("https://vidlink.pro/movie/786892?{}", DEFAULT_QUERY)
        );
        assert_eq!(
            provider.episode_url(94997, 2, 3),
            format!("https://vidlink.pro/tv/94997/2/3?{}", DEFAULT_QUERY)
        );
    }

    #[test]
    fn test_all_options_in_order() {
        let options = VidLinkConfig {
            primary_color: Some("B20710".to_string()),
            secondary_color: Some("170000".to_string()),
            icon_color: Some("B20710".to_string()),
            icons: Some(VidLinkIcons::Vid),
            title: Some(true),
            poster: Some(false),
            autoplay: Some(false),
            next_button: Some(true),
            player: Some(VidLinkPlayer::Jwplayer),
        };
        let provider = VidLinkProvider::new(&options);
        assert_eq!(
            provider.movie_url(1),
            "https://vidlink.pro/movie/1?primaryColor=B20710&secondaryColor=170000&iconColor=B20710\
             &icons=vid&title=true&poster=false&autoplay=false&nextbutton=true&player=jwplayer"
        );
    }

    #[test]
    fn test_no_options_means_no_query() {
        let options = VidLinkConfig {
            primary_color: None,
            secondary_color: Some("".to_string()),
            icon_color: None,
            icons: None,
            title: None,
            poster: None,
            autoplay: None,
            next_button: None,
            player: None,
        };
        let provider = VidLinkProvider::new(&options);
        assert_eq!(provider.movie_url(5), "https://vidlink.pro/movie/5");
        assert_eq!(
            provider.anime_url(5, 1, AnimeAudio::Sub, true),
            "https://vidlink.pro/anime/5/1/sub?fallback=true"
        );
    }

    #[test]
    fn test_anime_url() {
        let provider = VidLinkProvider::default();
        assert_eq!(
            provider.anime_url(5114, 12, AnimeAudio::Dub, false),
            format!("https://vidlink.pro/anime/5114/12/dub?{}", DEFAULT_QUERY)
        );
        assert_eq!(
            provider.anime_url(5114, 12, AnimeAudio::Sub, true),
            format!("https://vidlink.pro/anime/5114/12/sub?{}&fallback=true", DEFAULT_QUERY)
        );
    }
}
