use std::collections::HashMap;
use std::sync::RwLock;

use super::{KeyValueStorage, StorageError};
use crate::notify::{ChangeNotifier, StorageEvent};

/// In-process storage, used for tests and single-view hosts.
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
    notifier: ChangeNotifier,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            notifier: ChangeNotifier::new(),
        }
    }

    /// Simulate another view writing to the shared storage.
    ///
    /// `None` removes the key. Listeners see an [`External`](crate::notify::ChangeSource::External)
    /// event.
    pub fn write_external(&self, key: &str, value: Option<&str>) {
        {
            let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
            match value {
                Some(value) => values.insert(key.to_string(), value.to_string()),
                None => values.remove(key),
            };
        }
        self.notifier.notify(&StorageEvent::external(key));
    }

    pub fn keys(&self) -> Vec<String> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<String> = values.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        self.notifier.notify(&StorageEvent::local(key));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let removed = self
            .values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        if removed.is_some() {
            self.notifier.notify(&StorageEvent::local(key));
        }
        Ok(())
    }

    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }
}
