//! Origin-scoped key-value storage.
//!
//! Values are strings (JSON text for structured data), mirroring browser storage.
//! Every successful write is announced on the backend's [`ChangeNotifier`].

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::path::PathBuf;
use thiserror::Error;

use crate::notify::{ChangeNotifier, StorageEvent, Subscription};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("failed to encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    fn notifier(&self) -> &ChangeNotifier;

    /// Listen for changes to a single key, from this handle or from elsewhere
    fn watch_key(
        &self,
        key: &str,
        listener: Box<dyn Fn(&StorageEvent) + Send + Sync>,
    ) -> Subscription {
        let key = key.to_string();
        self.notifier().subscribe(move |event| {
            if event.key == key {
                listener(event);
            }
        })
    }
}
