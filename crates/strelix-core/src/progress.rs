use std::sync::Arc;
use strelix_models::{MediaIdentity, ProgressRecord, ProgressSnapshot};
use tracing::{debug, info, warn};

use crate::notify::{ChangeSource, Subscription};
use crate::storage::{KeyValueStorage, StorageError};

/// Persisted playback progress, keyed by title.
///
/// Reads never fail: missing, unreadable or corrupt data reads as an empty snapshot
/// so that broken watch state can never block browsing or playback.
#[derive(Clone)]
pub struct ProgressStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
}

impl ProgressStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get_all(&self) -> ProgressSnapshot {
        read_snapshot(self.storage.as_ref(), &self.key)
    }

    pub fn get(&self, identity: &MediaIdentity) -> Option<ProgressRecord> {
        self.get_all().get(identity).cloned()
    }

    /// Replace the persisted progress with `snapshot`.
    ///
    /// This is a full overwrite, not a merge: titles missing from `snapshot` are
    /// dropped. The player always sends its complete state, but a partial snapshot
    /// would silently lose progress for every title it leaves out.
    pub fn ingest(&self, snapshot: &ProgressSnapshot) -> Result<(), StorageError> {
        let json = serde_json::to_string(snapshot).map_err(|source| StorageError::Encode {
            key: self.key.clone(),
            source,
        })?;
        self.storage.set(&self.key, &json)?;
        info!("Stored progress snapshot with {} record(s)", snapshot.len());
        Ok(())
    }

    pub fn clear_all(&self) -> Result<(), StorageError> {
        self.storage.remove(&self.key)?;
        info!("Cleared all watch progress");
        Ok(())
    }

    /// Rounded percentage watched; `None` when the duration is unknown
    pub fn percent_watched(record: &ProgressRecord) -> Option<u8> {
        record.percent_watched()
    }

    /// Call `listener` with a fresh snapshot whenever the progress key changes,
    /// whether the write came from this process or another view.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ProgressSnapshot) + Send + Sync + 'static,
    {
        self.subscribe_filtered(None, listener)
    }

    /// Like [`subscribe`](Self::subscribe), but only for writes made by another view.
    pub fn subscribe_external<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ProgressSnapshot) + Send + Sync + 'static,
    {
        self.subscribe_filtered(Some(ChangeSource::External), listener)
    }

    fn subscribe_filtered<F>(&self, source: Option<ChangeSource>, listener: F) -> Subscription
    where
        F: Fn(&ProgressSnapshot) + Send + Sync + 'static,
    {
        // Weak so the listener does not keep the storage (and itself) alive
        let storage = Arc::downgrade(&self.storage);
        let key = self.key.clone();
        self.storage.watch_key(
            &self.key,
            Box::new(move |event| {
                if source.map_or(false, |wanted| wanted != event.source) {
                    return;
                }
                if let Some(storage) = storage.upgrade() {
                    listener(&read_snapshot(storage.as_ref(), &key));
                }
            }),
        )
    }
}

fn read_snapshot(storage: &dyn KeyValueStorage, key: &str) -> ProgressSnapshot {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("No stored progress under '{}'", key);
            return ProgressSnapshot::new();
        }
        Err(e) => {
            warn!("Failed to read progress: {}. Using empty progress.", e);
            return ProgressSnapshot::new();
        }
    };

    match serde_json::from_str::<ProgressSnapshot>(&raw) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Stored progress under '{}' is malformed: {}. Using empty progress.", key, e);
            ProgressSnapshot::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;
    use strelix_models::{EpisodeKey, EpisodeProgress, PlaybackProgress};

    const KEY: &str = "vidLinkProgress";

    fn store() -> (Arc<MemoryStorage>, ProgressStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = ProgressStore::new(storage.clone(), KEY);
        (storage, store)
    }

    fn movie(id: u64, watched: f64, duration: f64) -> ProgressRecord {
        let mut record = ProgressRecord::new(
            MediaIdentity::movie(id),
            format!("Movie {}", id),
            PlaybackProgress::new(watched, duration),
        );
        record.poster_path = Some(format!("/m{}.jpg", id));
        record.last_updated = Some(Utc.timestamp_millis_opt(1_700_000_000_000 + id as i64).unwrap());
        record
    }

    fn series(id: u64) -> ProgressRecord {
        let mut record = ProgressRecord::new(
            MediaIdentity::series(id),
            format!("Show {}", id),
            PlaybackProgress::new(600.0, 2400.0),
        );
        record.last_season_watched = Some(1);
        record.last_episode_watched = Some(2);
        let episode = EpisodeProgress::new(1, 2, PlaybackProgress::new(600.0, 2400.0));
        record.show_progress = Some(
            [(EpisodeKey::new(1, 2).to_string(), episode)]
                .into_iter()
                .collect(),
        );
        record
    }

    #[test]
    fn test_empty_when_nothing_stored() {
        let (_, store) = store();
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn test_ingest_round_trip() {
        let (_, store) = store();
        let snapshot: ProgressSnapshot = vec![movie(1, 50.0, 100.0), series(2)].into_iter().collect();

        store.ingest(&snapshot).unwrap();
        assert_eq!(store.get_all(), snapshot);
        assert_eq!(store.get(&MediaIdentity::series(2)).unwrap().last_episode_watched, Some(2));
    }

    #[test]
    fn test_second_ingest_replaces() {
        let (_, store) = store();
        store
            .ingest(&vec![movie(1, 10.0, 100.0), movie(2, 20.0, 100.0)].into_iter().collect())
            .unwrap();

        let replacement: ProgressSnapshot = vec![movie(3, 30.0, 100.0)].into_iter().collect();
        store.ingest(&replacement).unwrap();

        let all = store.get_all();
        assert_eq!(all, replacement);
        assert!(!all.contains(&MediaIdentity::movie(1)));
    }

    #[test]
    fn test_corrupt_value_reads_empty() {
        let (storage, store) = store();
        storage.set(KEY, "definitely not json").unwrap();
        assert!(store.get_all().is_empty());

        storage.set(KEY, "[1, 2, 3]").unwrap();
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn test_clear_all() {
        let (storage, store) = store();
        store.ingest(&vec![movie(1, 10.0, 100.0)].into_iter().collect()).unwrap();
        store.clear_all().unwrap();
        assert!(store.get_all().is_empty());
        assert_eq!(storage.get(KEY).unwrap(), None);
        store.clear_all().unwrap();
    }

    #[test]
    fn test_percent_watched() {
        assert_eq!(ProgressStore::percent_watched(&movie(1, 2.0, 100.0)), Some(2));
        assert_eq!(ProgressStore::percent_watched(&movie(1, 0.0, 0.0)), None);
    }

    #[test]
    fn test_subscribers_get_fresh_snapshots() {
        let (storage, store) = store();
        let all_sizes = Arc::new(Mutex::new(Vec::new()));
        let external_sizes = Arc::new(Mutex::new(Vec::new()));

        let sink = all_sizes.clone();
        let _all = store.subscribe(move |snapshot| sink.lock().unwrap().push(snapshot.len()));
        let sink = external_sizes.clone();
        let _external = store.subscribe_external(move |snapshot| sink.lock().unwrap().push(snapshot.len()));

        store.ingest(&vec![movie(1, 10.0, 100.0)].into_iter().collect()).unwrap();
        let other_view: ProgressSnapshot = vec![movie(1, 10.0, 100.0), movie(2, 10.0, 100.0)].into_iter().collect();
        storage.write_external(KEY, Some(&serde_json::to_string(&other_view).unwrap()));
        storage.set("unrelated", "x").unwrap();

        assert_eq!(*all_sizes.lock().unwrap(), vec![1, 2]);
        assert_eq!(*external_sizes.lock().unwrap(), vec![2]);
    }
}
