pub mod backend;

use std::sync::Arc;

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};

use crate::models::{Reminder, StoredReminder};

pub const DEFAULT_STORAGE_KEY: &str = "reminders";

/// Whole-collection persistence for reminders under a single key.
///
/// There is no partial write: callers load, mutate in memory and save the full
/// sequence. Two stores over the same backend can therefore overwrite each
/// other's changes (last writer wins).
#[derive(Clone)]
pub struct ReminderStore {
    backend: Arc<dyn KeyValueBackend>,
    key: String,
}

impl ReminderStore {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self::with_key(backend, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(backend: Arc<dyn KeyValueBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// Read the collection. Missing, unparsable or non-array content yields an
    /// empty collection. Entries that do not read as reminders are kept as raw
    /// JSON so a later save writes them back untouched.
    pub async fn load(&self) -> Vec<StoredReminder> {
        let raw = match self.backend.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read reminders from '{}': {e}", self.key);
                return Vec::new();
            }
        };

        let items = match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(serde_json::Value::Array(items)) => items,
            Ok(_) => {
                tracing::warn!("Stored reminders under '{}' are not a list, ignoring", self.key);
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!("Stored reminders under '{}' are corrupt: {e}", self.key);
                return Vec::new();
            }
        };

        items
            .into_iter()
            .map(|item| match serde_json::from_value::<Reminder>(item.clone()) {
                Ok(reminder) => StoredReminder::Known(reminder),
                Err(e) => {
                    tracing::warn!("Keeping unreadable reminder record as-is: {e}");
                    StoredReminder::Unreadable(item)
                }
            })
            .collect()
    }

    /// The readable reminders of the collection, in stored order.
    pub async fn reminders(&self) -> Vec<Reminder> {
        self.load()
            .await
            .into_iter()
            .filter_map(|record| match record {
                StoredReminder::Known(reminder) => Some(reminder),
                StoredReminder::Unreadable(_) => None,
            })
            .collect()
    }

    /// Write the full collection. Failures are logged and dropped.
    pub async fn save(&self, reminders: &[StoredReminder]) {
        let raw = match serde_json::to_string(reminders) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Failed to serialize reminders: {e}");
                return;
            }
        };

        if let Err(e) = self.backend.set(&self.key, &raw).await {
            tracing::warn!("Failed to persist reminders to '{}': {e}", self.key);
        }
    }
}
