use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use strelix_models::{MediaIdentity, WatchlistDraft, WatchlistEntry};
use tracing::{debug, info, warn};

use crate::notify::Subscription;
use crate::storage::{KeyValueStorage, StorageError};

/// Saved titles, newest first, unique per identity.
#[derive(Clone)]
pub struct WatchlistStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
}

impl WatchlistStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// All entries, newest first. Unreadable or malformed data reads as empty.
    pub fn list(&self) -> Vec<WatchlistEntry> {
        read_entries(self.storage.as_ref(), &self.key)
    }

    pub fn contains(&self, identity: &MediaIdentity) -> bool {
        self.list().iter().any(|entry| entry.identity() == *identity)
    }

    /// Prepend `draft` stamped with the current time. Returns `false` without
    /// writing if the title is already saved.
    pub fn add(&self, draft: WatchlistDraft) -> Result<bool, StorageError> {
        let mut entries = self.list();
        let identity = draft.identity();
        if entries.iter().any(|entry| entry.identity() == identity) {
            debug!("{} is already on the watchlist", identity);
            return Ok(false);
        }

        entries.insert(0, draft.into_entry(Utc::now()));
        self.save(&entries)?;
        info!("Added {} to the watchlist ({} entries)", identity, entries.len());
        Ok(true)
    }

    /// Remove the entry for `identity`. Returns `false` if it was not saved.
    pub fn remove(&self, identity: &MediaIdentity) -> Result<bool, StorageError> {
        let mut entries = self.list();
        let before = entries.len();
        entries.retain(|entry| entry.identity() != *identity);
        if entries.len() == before {
            debug!("{} is not on the watchlist", identity);
            return Ok(false);
        }

        self.save(&entries)?;
        info!("Removed {} from the watchlist ({} entries)", identity, entries.len());
        Ok(true)
    }

    /// Add if absent, remove if present. Returns whether the title is now saved.
    pub fn toggle(&self, draft: WatchlistDraft) -> Result<bool, StorageError> {
        let identity = draft.identity();
        if self.contains(&identity) {
            self.remove(&identity)?;
            Ok(false)
        } else {
            self.add(draft)?;
            Ok(true)
        }
    }

    pub fn clear_all(&self) -> Result<(), StorageError> {
        self.storage.remove(&self.key)?;
        info!("Cleared the watchlist");
        Ok(())
    }

    /// Call `listener` with the current entries whenever the watchlist key changes
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[WatchlistEntry]) + Send + Sync + 'static,
    {
        let storage = Arc::downgrade(&self.storage);
        let key = self.key.clone();
        self.storage.watch_key(
            &self.key,
            Box::new(move |_| {
                if let Some(storage) = storage.upgrade() {
                    listener(&read_entries(storage.as_ref(), &key));
                }
            }),
        )
    }

    fn save(&self, entries: &[WatchlistEntry]) -> Result<(), StorageError> {
        let json = serde_json::to_string(entries).map_err(|source| StorageError::Encode {
            key: self.key.clone(),
            source,
        })?;
        self.storage.set(&self.key, &json)
    }
}

fn read_entries(storage: &dyn KeyValueStorage, key: &str) -> Vec<WatchlistEntry> {
    match storage.get(key) {
        Ok(Some(raw)) => match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(values) => decode_entries(key, values),
            Err(e) => {
                warn!("Stored watchlist under '{}' is malformed: {}. Using empty watchlist.", key, e);
                Vec::new()
            }
        },
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!("Failed to read watchlist: {}. Using empty watchlist.", e);
            Vec::new()
        }
    }
}

/// Decode entries one by one so a single bad entry does not hide the rest.
fn decode_entries(key: &str, values: Vec<Value>) -> Vec<WatchlistEntry> {
    let total = values.len();
    let entries: Vec<WatchlistEntry> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping malformed watchlist entry {} under '{}': {}", index, key, e);
                None
            }
        })
        .collect();
    if entries.len() < total {
        warn!("Read {} of {} watchlist entries under '{}'", entries.len(), total, key);
    }
    entries
}
