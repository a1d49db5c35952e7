//! Datadrop Registry Library
//!
//! The in-memory source of truth for "what exists and is retrievable": a
//! concurrency-safe map from share id to [`ShareEntry`]. Entries appear only
//! after their bytes are durably committed, so the atomic `put`/`get` pair
//! is the single rendezvous between an upload and any later download.
//!
//! The registry is deliberately not persisted; blobs on disk with no
//! registry entry are reclaimed by the startup reconciliation pass.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use datadrop_core::ShareEntry;
use tokio::sync::Mutex;

/// Registry operation errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The id is already registered. Ids carry 128 bits of entropy, so this
    /// indicates a logic error rather than bad luck.
    #[error("Share id already registered: {0}")]
    Conflict(String),
}

/// Concurrency-safe share registry.
///
/// The lock guards map operations only and is never held across I/O.
#[derive(Default)]
pub struct ShareRegistry {
    entries: Mutex<HashMap<String, ShareEntry>>,
}

impl ShareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a completed upload. Fails with [`RegistryError::Conflict`]
    /// if the id already exists.
    pub async fn put(&self, entry: ShareEntry) -> Result<(), RegistryError> {
        let mut entries = self.entries.lock().await;
        let key = entry.id.as_str().to_string();
        if entries.contains_key(&key) {
            return Err(RegistryError::Conflict(key));
        }
        entries.insert(key, entry);
        Ok(())
    }

    /// Look up an entry by id. Expiry is the caller's concern: an expired
    /// entry is still returned here so the reaper can see it.
    pub async fn get(&self, id: &str) -> Option<ShareEntry> {
        self.entries.lock().await.get(id).cloned()
    }

    /// Remove an entry. Idempotent; returns the entry if it was present.
    pub async fn remove(&self, id: &str) -> Option<ShareEntry> {
        self.entries.lock().await.remove(id)
    }

    /// All entries whose retention window has passed.
    pub async fn list_expired(&self, now: DateTime<Utc>) -> Vec<ShareEntry> {
        self.entries
            .lock()
            .await
            .values()
            .filter(|entry| entry.is_expired(now))
            .cloned()
            .collect()
    }

    /// All registered ids, for startup reconciliation against on-disk blobs.
    pub async fn ids(&self) -> Vec<String> {
        self.entries.lock().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use datadrop_core::ShareId;

    fn entry_with_expiry(expires_in: Duration) -> ShareEntry {
        let now = Utc::now();
        let id = ShareId::generate();
        ShareEntry {
            storage_key: id.as_str().to_string(),
            id,
            original_name: "a.txt".to_string(),
            size_bytes: 10,
            content_type: "text/plain".to_string(),
            created_at: now,
            expires_at: now + expires_in,
        }
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let registry = ShareRegistry::new();
        let entry = entry_with_expiry(Duration::hours(24));
        let id = entry.id.clone();

        registry.put(entry).await.unwrap();

        let found = registry.get(id.as_str()).await.unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.original_name, "a.txt");
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_put_duplicate_id_conflicts() {
        let registry = ShareRegistry::new();
        let entry = entry_with_expiry(Duration::hours(24));
        let duplicate = entry.clone();

        registry.put(entry).await.unwrap();
        assert!(matches!(
            registry.put(duplicate).await,
            Err(RegistryError::Conflict(_))
        ));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = ShareRegistry::new();
        let entry = entry_with_expiry(Duration::hours(24));
        let id = entry.id.clone();

        registry.put(entry).await.unwrap();
        assert!(registry.remove(id.as_str()).await.is_some());
        assert!(registry.remove(id.as_str()).await.is_none());
        assert!(registry.get(id.as_str()).await.is_none());
    }

    #[tokio::test]
    async fn test_list_expired_splits_on_deadline() {
        let registry = ShareRegistry::new();
        let live = entry_with_expiry(Duration::hours(24));
        let dead = entry_with_expiry(Duration::hours(-1));
        let dead_id = dead.id.clone();

        registry.put(live).await.unwrap();
        registry.put(dead).await.unwrap();

        let expired = registry.list_expired(Utc::now()).await;
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, dead_id);
    }

    #[tokio::test]
    async fn test_ids_lists_all_keys() {
        let registry = ShareRegistry::new();
        assert!(registry.is_empty().await);

        let first = entry_with_expiry(Duration::hours(1));
        let second = entry_with_expiry(Duration::hours(1));
        let mut expected = vec![
            first.id.as_str().to_string(),
            second.id.as_str().to_string(),
        ];
        registry.put(first).await.unwrap();
        registry.put(second).await.unwrap();

        let mut ids = registry.ids().await;
        ids.sort();
        expected.sort();
        assert_eq!(ids, expected);
    }
}
