pub mod config;
pub mod paths;

pub use config::{
    Config, ContinueWatchingConfig, LoggingConfig, PlayerConfig, ProvidersConfig, StorageConfig,
    VidLinkConfig, VidLinkIcons, VidLinkPlayer, DEFAULT_MESSAGE_TYPE, DEFAULT_TRUSTED_ORIGIN,
};
pub use paths::{base_path_override, PathManager};
