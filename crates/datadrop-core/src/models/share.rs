use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::share_id::ShareId;

/// One completed upload, as tracked by the registry.
///
/// An entry exists only after its bytes are fully committed to the blob
/// store; readers can never observe a half-written share. `storage_key` is
/// derived from `id` alone, never from the client-supplied filename.
#[derive(Debug, Clone)]
pub struct ShareEntry {
    pub id: ShareId,
    /// Sanitized original filename; used for download response naming only.
    pub original_name: String,
    pub size_bytes: u64,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub storage_key: String,
}

impl ShareEntry {
    /// Expired entries are treated as absent by readers even before the
    /// reaper removes them.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Upload response returned to the client.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShareResponse {
    /// Opaque share identifier.
    pub id: String,
    /// Ready-to-share download URL.
    pub url: String,
    pub original_name: String,
    pub size_bytes: u64,
    pub content_type: String,
    pub expires_at: DateTime<Utc>,
}

impl ShareResponse {
    pub fn from_entry(entry: &ShareEntry, url: String) -> Self {
        ShareResponse {
            id: entry.id.to_string(),
            url,
            original_name: entry.original_name.clone(),
            size_bytes: entry.size_bytes,
            content_type: entry.content_type.clone(),
            expires_at: entry.expires_at,
        }
    }
}
