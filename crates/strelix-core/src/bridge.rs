//! Bridge between the embedded player and the progress store.
//!
//! The player runs in a third-party frame and posts its complete progress state as
//! `{ "type": "MEDIA_DATA", "data": { ... } }`. The bridge only accepts messages
//! from the trusted player origin, stores the snapshot, and tells its refresh
//! listeners when another view has changed the stored progress.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use strelix_config::PlayerConfig;
use strelix_models::ProgressSnapshot;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::continue_watching::{ContinueWatchingItem, ContinueWatchingSelector};
use crate::notify::Subscription;
use crate::progress::ProgressStore;
use crate::storage::StorageError;

/// A cross-document message as delivered to the host view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InboundMessage {
    pub origin: String,
    pub payload: Value,
}

impl InboundMessage {
    pub fn new(origin: impl Into<String>, payload: Value) -> Self {
        Self {
            origin: origin.into(),
            payload,
        }
    }
}

/// Why a message was dropped without touching storage
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MessageRejection {
    #[error("bridge is not listening")]
    Detached,
    #[error("untrusted origin '{0}'")]
    UntrustedOrigin(String),
    #[error("unexpected message type {0:?}")]
    UnexpectedType(Option<String>),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

#[derive(Debug)]
pub enum MessageOutcome {
    /// The snapshot replaced the stored progress
    Ingested { records: usize },
    Rejected(MessageRejection),
    /// The message was valid but the store could not be written
    PersistFailed(StorageError),
}

impl MessageOutcome {
    pub fn is_ingested(&self) -> bool {
        matches!(self, MessageOutcome::Ingested { .. })
    }
}

type RefreshListener = Arc<dyn Fn(&[ContinueWatchingItem]) + Send + Sync>;

pub struct SyncBridge {
    progress: ProgressStore,
    selector: ContinueWatchingSelector,
    trusted_origin: String,
    message_type: String,
    /// `Some` while listening
    subscription: Mutex<Option<Subscription>>,
    refresh_listeners: Arc<Mutex<Vec<RefreshListener>>>,
}

impl SyncBridge {
    /// A detached bridge; call [`attach`](Self::attach) to start accepting messages.
    pub fn new(progress: ProgressStore, selector: ContinueWatchingSelector, player: &PlayerConfig) -> Self {
        Self {
            progress,
            selector,
            trusted_origin: player.trusted_origin.clone(),
            message_type: player.message_type.clone(),
            subscription: Mutex::new(None),
            refresh_listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn trusted_origin(&self) -> &str {
        &self.trusted_origin
    }

    /// Start listening. Attaching twice is a no-op.
    pub fn attach(&self) {
        let mut subscription = self.lock_subscription();
        if subscription.is_some() {
            return;
        }

        let selector = self.selector;
        let listeners = self.refresh_listeners.clone();
        *subscription = Some(self.progress.subscribe_external(move |snapshot| {
            let items = selector.select(snapshot);
            debug!("Progress changed in another view; refreshing {} item(s)", items.len());
            let listeners: Vec<RefreshListener> = listeners
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone();
            for listener in listeners {
                listener(&items);
            }
        }));
        info!("Sync bridge listening for messages from {}", self.trusted_origin);
    }

    /// Stop listening and drop the storage subscription. Detaching twice is a no-op.
    pub fn detach(&self) {
        if self.lock_subscription().take().is_some() {
            info!("Sync bridge detached");
        }
    }

    pub fn is_listening(&self) -> bool {
        self.lock_subscription().is_some()
    }

    /// Register a listener for the recomputed continue-watching row after another
    /// view changes the stored progress. Listeners live as long as the bridge.
    pub fn on_refresh<F>(&self, listener: F)
    where
        F: Fn(&[ContinueWatchingItem]) + Send + Sync + 'static,
    {
        self.refresh_listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::new(listener));
    }

    /// Validate a message and, if it is a progress snapshot from the player, store it.
    pub fn handle_message(&self, message: &InboundMessage) -> MessageOutcome {
        let snapshot = match self.accept(message) {
            Ok(snapshot) => snapshot,
            Err(rejection) => {
                debug!("Ignoring message from {}: {}", message.origin, rejection);
                return MessageOutcome::Rejected(rejection);
            }
        };

        let records = snapshot.len();
        match self.progress.ingest(&snapshot) {
            Ok(()) => MessageOutcome::Ingested { records },
            Err(e) => {
                warn!("Failed to store progress from player: {}", e);
                MessageOutcome::PersistFailed(e)
            }
        }
    }

    fn accept(&self, message: &InboundMessage) -> Result<ProgressSnapshot, MessageRejection> {
        if !self.is_listening() {
            return Err(MessageRejection::Detached);
        }
        if message.origin != self.trusted_origin {
            return Err(MessageRejection::UntrustedOrigin(message.origin.clone()));
        }

        let message_type = message.payload.get("type").and_then(Value::as_str);
        if message_type != Some(self.message_type.as_str()) {
            return Err(MessageRejection::UnexpectedType(message_type.map(str::to_string)));
        }

        match message.payload.get("data") {
            Some(data @ Value::Object(entries)) => {
                let snapshot = ProgressSnapshot::deserialize(data)
                    .map_err(|e| MessageRejection::MalformedPayload(e.to_string()))?;
                // Storing nothing would wipe the saved progress
                if snapshot.is_empty() && !entries.is_empty() {
                    return Err(MessageRejection::MalformedPayload(format!(
                        "none of the {} progress entries could be decoded",
                        entries.len()
                    )));
                }
                Ok(snapshot)
            }
            Some(other) => Err(MessageRejection::MalformedPayload(format!(
                "expected an object for data, got {}",
                json_kind(other)
            ))),
            None => Err(MessageRejection::MalformedPayload("missing data".to_string())),
        }
    }

    fn lock_subscription(&self) -> std::sync::MutexGuard<'_, Option<Subscription>> {
        self.subscription.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for SyncBridge {
    fn drop(&mut self) {
        self.detach();
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests;
