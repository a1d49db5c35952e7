//! Datadrop Storage Library
//!
//! On-disk placement of uploaded file content with write-then-publish
//! semantics. Uploads stream into a private staging file and become visible
//! to readers only through an atomic rename into the blobs directory, so a
//! concurrent download can never observe a half-written file.
//!
//! # Layout
//!
//! Under one configurable root (a single filesystem, which keeps the
//! publishing rename atomic):
//!
//! - `<root>/staging/<uuid>.part`: in-flight uploads, one private file each
//! - `<root>/blobs/<key>`: published content, keyed by share id
//!
//! Keys must match the share-id alphabet (`[A-Za-z0-9_-]`); nothing else is
//! accepted, so a key can never escape the blobs directory.

pub mod store;

pub use store::{BlobStore, StorageError, StorageResult, WriteHandle};
