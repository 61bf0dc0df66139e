pub mod clear;
pub mod config;
pub mod listen;
pub mod play;
pub mod progress;
pub mod providers;
pub mod watchlist;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use strelix_config::{Config, PathManager};
use strelix_core::{FileStorage, WatchState};

/// Paths and configuration shared by every command
pub struct AppContext {
    pub paths: PathManager,
    pub config_file: PathBuf,
    pub config: Config,
}

impl AppContext {
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let paths = PathManager::default();
        let config_file = config_override.unwrap_or_else(|| paths.config_file());

        let config = Config::load_or_default(&config_file)
            .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
        config
            .validate()
            .map_err(|e| eyre!("Invalid config in {}: {}", config_file.display(), e))?;

        Ok(Self {
            paths,
            config_file,
            config,
        })
    }

    pub fn storage_file(&self) -> PathBuf {
        self.config
            .storage
            .path
            .clone()
            .unwrap_or_else(|| self.paths.storage_file())
    }

    /// Open the shared storage file and wire the watch-state components to it
    pub fn open_state(&self) -> Result<(Arc<FileStorage>, WatchState)> {
        let storage_file = self.storage_file();
        let storage = Arc::new(
            FileStorage::open(&storage_file)
                .map_err(|e| eyre!("Failed to open storage at {}: {}", storage_file.display(), e))?,
        );
        let state = WatchState::new(&self.config, storage.clone());
        Ok((storage, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strelix_models::{MediaIdentity, WatchlistDraft};

    #[test]
    fn test_context_uses_configured_storage_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_file = dir.path().join("config.toml");
        let storage_file = dir.path().join("state").join("storage.json");

        let mut config = Config::default();
        config.storage.path = Some(storage_file.clone());
        config.save_to_file(&config_file).unwrap();

        let ctx = AppContext::load(Some(config_file.clone())).unwrap();
        assert_eq!(ctx.config_file, config_file);
        assert_eq!(ctx.storage_file(), storage_file);

        let (_, state) = ctx.open_state().unwrap();
        state
            .watchlist()
            .add(WatchlistDraft::new(MediaIdentity::series(1399), "Game of Thrones"))
            .unwrap();
        assert!(storage_file.exists());

        // A second context over the same files sees the write
        let (_, reopened) = AppContext::load(Some(config_file)).unwrap().open_state().unwrap();
        assert!(reopened.watchlist().contains(&MediaIdentity::series(1399)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config_file = dir.path().join("config.toml");
        std::fs::write(&config_file, "[continue_watching]\nmin_percent = 90\nmax_percent = 10\n").unwrap();

        assert!(AppContext::load(Some(config_file)).is_err());
    }
}
