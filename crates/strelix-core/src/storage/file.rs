use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use super::{KeyValueStorage, StorageError};
use crate::notify::{ChangeNotifier, StorageEvent};

type Entries = BTreeMap<String, String>;

/// Durable storage backed by one JSON file (`{ "key": "value", ... }`).
///
/// Every read goes to disk, so several processes sharing the file see each other's
/// writes the way browser tabs share storage. Writes are read-modify-write with an
/// atomic rename and last-writer-wins across processes.
///
/// Writes from other processes are not observed automatically; call
/// [`poll_external_changes`](FileStorage::poll_external_changes) to diff the file
/// against what this handle last saw and emit external change events.
pub struct FileStorage {
    path: PathBuf,
    /// Contents as last read or written by this handle; also serializes local writes
    last_seen: Mutex<Entries>,
    notifier: ChangeNotifier,
}

impl FileStorage {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let storage = Self {
            path,
            last_seen: Mutex::new(Entries::new()),
            notifier: ChangeNotifier::new(),
        };

        let initial = match storage.read_entries() {
            Ok(entries) => entries,
            Err(e) => {
                // Left in place; the next write backs it up and starts fresh
                warn!("{}. Treating storage as empty until the next write.", e);
                Entries::new()
            }
        };
        debug!(
            "Opened storage at {:?} ({} key(s))",
            storage.path,
            initial.len()
        );
        *storage.lock_last_seen() = initial;

        Ok(storage)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file and report keys whose values changed since this handle last
    /// looked, notifying listeners with external events.
    pub fn poll_external_changes(&self) -> Result<Vec<String>, StorageError> {
        let current = self.read_entries()?;
        let changed: Vec<String> = {
            let mut last_seen = self.lock_last_seen();
            let keys: BTreeSet<&String> = last_seen.keys().chain(current.keys()).collect();
            let changed = keys
                .into_iter()
                .filter(|key| last_seen.get(*key) != current.get(*key))
                .cloned()
                .collect();
            *last_seen = current;
            changed
        };

        if !changed.is_empty() {
            debug!("Detected external changes to {:?}", changed);
        }
        for key in &changed {
            self.notifier.notify(&StorageEvent::external(key.as_str()));
        }
        Ok(changed)
    }

    fn lock_last_seen(&self) -> std::sync::MutexGuard<'_, Entries> {
        self.last_seen.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read_entries(&self) -> Result<Entries, StorageError> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Entries::new());
        }

        serde_json::from_str(&content).map_err(|e| StorageError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Current entries for a write. A corrupt file is backed up and replaced.
    fn entries_for_write(&self) -> Result<Entries, StorageError> {
        match self.read_entries() {
            Ok(entries) => Ok(entries),
            Err(StorageError::Corrupt { reason, .. }) => {
                let backup_path = self.path.with_extension("json.bak");
                match std::fs::copy(&self.path, &backup_path) {
                    Ok(_) => info!(
                        "Storage file was corrupt ({}). Backed up to {:?} and starting fresh.",
                        reason, backup_path
                    ),
                    Err(backup_err) => warn!(
                        "Storage file was corrupt ({}) and backup failed: {}. Starting fresh.",
                        reason, backup_err
                    ),
                }
                Ok(Entries::new())
            }
            Err(e) => Err(e),
        }
    }

    fn write_entries(&self, entries: &Entries) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(entries).map_err(|source| StorageError::Encode {
            key: self.path.display().to_string(),
            source,
        })?;

        // Atomic write: temp file, then rename
        let temp_path = self.path.with_extension("json.tmp");
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        std::fs::write(&temp_path, json).map_err(io_err)?;
        std::fs::rename(&temp_path, &self.path).map_err(io_err)?;
        Ok(())
    }

    /// Apply one key update under the handle lock and report whether anything changed
    fn update(&self, key: &str, value: Option<&str>) -> Result<bool, StorageError> {
        let mut last_seen = self.lock_last_seen();
        let mut entries = self.entries_for_write()?;

        let changed = match value {
            Some(value) => entries.insert(key.to_string(), value.to_string()).as_deref() != Some(value),
            None => entries.remove(key).is_some(),
        };
        if !changed {
            return Ok(false);
        }

        self.write_entries(&entries)?;

        // Only this key is marked as seen; other keys that changed on disk are left
        // for poll_external_changes to report.
        match value {
            Some(value) => last_seen.insert(key.to_string(), value.to_string()),
            None => last_seen.remove(key),
        };
        Ok(true)
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.update(key, Some(value))? {
            debug!("Stored '{}' ({} bytes)", key, value.len());
        }
        // Re-setting an identical value still counts as a write for listeners
        self.notifier.notify(&StorageEvent::local(key));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if self.update(key, None)? {
            debug!("Removed '{}'", key);
            self.notifier.notify(&StorageEvent::local(key));
        }
        Ok(())
    }

    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ChangeSource;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("storage.json");

        let storage = FileStorage::open(&path).unwrap();
        storage.set("preferredServer", "vidsrc").unwrap();
        storage.set("vidLinkProgress", "{}").unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("preferredServer").unwrap(), Some("vidsrc".to_string()));
        assert_eq!(reopened.get("vidLinkProgress").unwrap(), Some("{}".to_string()));

        reopened.remove("preferredServer").unwrap();
        assert_eq!(reopened.get("preferredServer").unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_reads_fail_and_writes_recover() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{ not json").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert!(matches!(storage.get("k"), Err(StorageError::Corrupt { .. })));

        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap(), Some("v".to_string()));
        let backup = std::fs::read_to_string(dir.path().join("storage.json.bak")).unwrap();
        assert_eq!(backup, "{ not json");
    }

    #[test]
    fn test_two_handles_share_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let first = FileStorage::open(&path).unwrap();
        let second = FileStorage::open(&path).unwrap();

        first.set("a", "1").unwrap();
        assert_eq!(second.get("a").unwrap(), Some("1".to_string()));

        // Last writer wins
        second.set("a", "2").unwrap();
        assert_eq!(first.get("a").unwrap(), Some("2".to_string()));
    }

    #[test]
    fn test_poll_reports_external_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let host = FileStorage::open(&path).unwrap();
        let other = FileStorage::open(&path).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = host.notifier().subscribe(move |event| {
            sink.lock().unwrap().push((event.key.clone(), event.source));
        });

        host.set("mine", "x").unwrap();
        other.set("progress", "{\"a\":1}").unwrap();
        other.set("watchlist", "[]").unwrap();

        let changed = host.poll_external_changes().unwrap();
        assert_eq!(changed, vec!["progress".to_string(), "watchlist".to_string()]);
        assert!(host.poll_external_changes().unwrap().is_empty());

        other.remove("progress").unwrap();
        assert_eq!(host.poll_external_changes().unwrap(), vec!["progress".to_string()]);

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], ("mine".to_string(), ChangeSource::Local));
        assert_eq!(
            seen[1..].iter().filter(|(_, source)| *source == ChangeSource::External).count(),
            3
        );
    }
}
