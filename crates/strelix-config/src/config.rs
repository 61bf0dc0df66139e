use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_TRUSTED_ORIGIN: &str = "https://vidlink.pro";
pub const DEFAULT_MESSAGE_TYPE: &str = "MEDIA_DATA";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub continue_watching: ContinueWatchingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Embedded player that is allowed to report progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Exact origin (scheme://host[:port]) messages must come from
    #[serde(default = "default_trusted_origin")]
    pub trusted_origin: String,
    /// Payload `type` tag carrying a progress snapshot
    #[serde(default = "default_message_type")]
    pub message_type: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            trusted_origin: default_trusted_origin(),
            message_type: default_message_type(),
        }
    }
}

/// Persisted key layout. The key names match what the web front end uses so a
/// storage dump can be moved between the two.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage file; defaults to `<data_dir>/storage.json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default = "default_progress_key")]
    pub progress_key: String,
    #[serde(default = "default_watchlist_key")]
    pub watchlist_key: String,
    #[serde(default = "default_preferred_provider_key")]
    pub preferred_provider_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            progress_key: default_progress_key(),
            watchlist_key: default_watchlist_key(),
            preferred_provider_key: default_preferred_provider_key(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub vidlink: VidLinkConfig,
}

/// Player customisation passed to VidLink as query parameters.
///
/// Unset (or empty) values are left out of the URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VidLinkConfig {
    #[serde(default = "default_primary_color")]
    pub primary_color: Option<String>,
    #[serde(default = "default_secondary_color")]
    pub secondary_color: Option<String>,
    #[serde(default = "default_icon_color")]
    pub icon_color: Option<String>,
    #[serde(default)]
    pub icons: Option<VidLinkIcons>,
    #[serde(default)]
    pub title: Option<bool>,
    #[serde(default)]
    pub poster: Option<bool>,
    #[serde(default = "default_autoplay")]
    pub autoplay: Option<bool>,
    #[serde(default)]
    pub next_button: Option<bool>,
    #[serde(default)]
    pub player: Option<VidLinkPlayer>,
}

impl Default for VidLinkConfig {
    fn default() -> Self {
        Self {
            primary_color: default_primary_color(),
            secondary_color: default_secondary_color(),
            icon_color: default_icon_color(),
            icons: None,
            title: None,
            poster: None,
            autoplay: default_autoplay(),
            next_button: None,
            player: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VidLinkIcons {
    Vid,
    Default,
}

impl VidLinkIcons {
    pub fn as_str(&self) -> &'static str {
        match self {
            VidLinkIcons::Vid => "vid",
            VidLinkIcons::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VidLinkPlayer {
    Default,
    Jwplayer,
}

impl VidLinkPlayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            VidLinkPlayer::Default => "default",
            VidLinkPlayer::Jwplayer => "jwplayer",
        }
    }
}

/// Bounds of the continue-watching row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContinueWatchingConfig {
    /// Records at or below this percentage count as "just started"
    #[serde(default = "default_min_percent")]
    pub min_percent: u8,
    /// Records at or above this percentage count as finished
    #[serde(default = "default_max_percent")]
    pub max_percent: u8,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for ContinueWatchingConfig {
    fn default() -> Self {
        Self {
            min_percent: default_min_percent(),
            max_percent: default_max_percent(),
            limit: default_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Force JSON (true) or plain (false) output; auto-detected from the terminal when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
    /// Write logs to this file (rotated daily) instead of stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: None,
            file: None,
        }
    }
}

fn default_trusted_origin() -> String {
    DEFAULT_TRUSTED_ORIGIN.to_string()
}

fn default_message_type() -> String {
    DEFAULT_MESSAGE_TYPE.to_string()
}

fn default_progress_key() -> String {
    "vidLinkProgress".to_string()
}

fn default_watchlist_key() -> String {
    "strelix_watchlist".to_string()
}

fn default_preferred_provider_key() -> String {
    "preferredServer".to_string()
}

fn default_primary_color() -> Option<String> {
    Some("ffffff".to_string())
}

fn default_secondary_color() -> Option<String> {
    Some("4a4a4a".to_string())
}

fn default_icon_color() -> Option<String> {
    Some("ffffff".to_string())
}

fn default_autoplay() -> Option<bool> {
    Some(true)
}

fn default_min_percent() -> u8 {
    5
}

fn default_max_percent() -> u8 {
    95
}

fn default_limit() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let origin = url::Url::parse(&self.player.trusted_origin).map_err(|e| {
            anyhow::anyhow!("Invalid trusted_origin '{}': {}", self.player.trusted_origin, e)
        })?;
        // Browsers compare the serialized origin, so a path or trailing slash would never match
        if origin.origin().ascii_serialization() != self.player.trusted_origin {
            return Err(anyhow::anyhow!(
                "trusted_origin must be a bare origin like 'https://vidlink.pro', got '{}'",
                self.player.trusted_origin
            ));
        }

        if self.player.message_type.trim().is_empty() {
            return Err(anyhow::anyhow!("message_type cannot be empty"));
        }

        for (name, key) in [
            ("progress_key", &self.storage.progress_key),
            ("watchlist_key", &self.storage.watchlist_key),
            ("preferred_provider_key", &self.storage.preferred_provider_key),
        ] {
            if key.trim().is_empty() {
                return Err(anyhow::anyhow!("storage.{} cannot be empty", name));
            }
        }

        let cw = &self.continue_watching;
        if cw.max_percent > 100 {
            return Err(anyhow::anyhow!("continue_watching.max_percent must be at most 100"));
        }
        if cw.min_percent >= cw.max_percent {
            return Err(anyhow::anyhow!(
                "continue_watching.min_percent ({}) must be below max_percent ({})",
                cw.min_percent,
                cw.max_percent
            ));
        }
        if cw.limit == 0 {
            return Err(anyhow::anyhow!("continue_watching.limit must be greater than zero"));
        }

        Ok(())
    }
}
