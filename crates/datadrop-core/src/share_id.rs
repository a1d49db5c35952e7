//! Share identifiers.
//!
//! A share id is the only capability a downloader needs, so it must be
//! practically unguessable: 128 bits from the OS-seeded CSPRNG, encoded as
//! unpadded URL-safe base64 (22 characters). Ids are never reused; expiry
//! permanently invalidates them.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Raw entropy per id.
const SHARE_ID_BYTES: usize = 16;
/// Encoded length of [`SHARE_ID_BYTES`] in unpadded base64.
const SHARE_ID_LEN: usize = 22;

/// Opaque, URL-safe identifier for one completed upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareId(String);

impl ShareId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SHARE_ID_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        ShareId(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Parse an id received over the wire. Returns `None` for anything that
    /// could not have been issued by [`ShareId::generate`].
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() != SHARE_ID_LEN {
            return None;
        }
        if !raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return None;
        }
        Some(ShareId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
