use std::path::PathBuf;
use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const STAGING_DIR: &str = "staging";
const BLOBS_DIR: &str = "blobs";
const STAGING_SUFFIX: &str = ".part";

/// Storage operation errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid blob key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Blob keys are restricted to the share-id alphabet, so a key can never
/// name a path outside the blobs directory.
fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty()
        || !key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(StorageError::InvalidKey(format!(
            "Blob key contains invalid characters: {:?}",
            key
        )));
    }
    Ok(())
}

/// Local filesystem blob store with staged writes and atomic publish.
#[derive(Clone)]
pub struct BlobStore {
    staging_path: PathBuf,
    blobs_path: PathBuf,
}

impl BlobStore {
    /// Create a new BlobStore rooted at `base_path`, creating the staging
    /// and blobs directories if needed.
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        let staging_path = base_path.join(STAGING_DIR);
        let blobs_path = base_path.join(BLOBS_DIR);

        for dir in [&staging_path, &blobs_path] {
            fs::create_dir_all(dir).await.map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create storage directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        Ok(BlobStore {
            staging_path,
            blobs_path,
        })
    }

    /// Convert a validated blob key to its filesystem path.
    fn blob_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.blobs_path.join(key))
    }

    /// Allocate a private staging file for one upload.
    pub async fn begin_write(&self) -> StorageResult<WriteHandle> {
        let staging_file = self
            .staging_path
            .join(format!("{}{}", Uuid::new_v4(), STAGING_SUFFIX));

        let file = fs::File::create(&staging_file).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to create staging file {}: {}",
                staging_file.display(),
                e
            ))
        })?;

        tracing::debug!(path = %staging_file.display(), "Staging file opened");

        Ok(WriteHandle {
            file: Some(file),
            staging_file,
            blobs_path: self.blobs_path.clone(),
            bytes_written: 0,
            finished: false,
        })
    }

    /// Open a published blob for chunked reading.
    pub async fn open_read(
        &self,
        key: &str,
    ) -> StorageResult<Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>> {
        let path = self.blob_path(key)?;

        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()));
            }
            Err(e) => {
                return Err(StorageError::ReadFailed(format!(
                    "Failed to open blob {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let reader = tokio_util::io::ReaderStream::new(file);
        let key = key.to_string();
        let stream = reader.map(move |result| {
            result.map_err(|e| {
                tracing::error!(key = %key, error = %e, "Blob stream read error");
                StorageError::ReadFailed(format!("Failed to read chunk: {}", e))
            })
        });

        Ok(Box::pin(stream))
    }

    /// Delete a published blob. Idempotent: deletion races with the reaper
    /// are expected, so an already-absent blob is not an error.
    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.blob_path(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(key = %key, "Blob deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(key = %key, "Blob already absent on delete");
                Ok(())
            }
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete blob {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Check whether a published blob exists.
    pub async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.blob_path(key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    /// List the keys of all published blobs, for startup reconciliation.
    pub async fn list_keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.blobs_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                keys.push(name.to_string());
            }
        }
        Ok(keys)
    }

    /// Remove leftover staging files from uploads that never committed
    /// (crashed or killed process). Returns the number removed.
    pub async fn purge_staging(&self) -> StorageResult<usize> {
        let mut purged = 0;
        let mut entries = fs::read_dir(&self.staging_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            match fs::remove_file(entry.path()).await {
                Ok(()) => purged += 1,
                Err(e) => {
                    tracing::warn!(
                        path = %entry.path().display(),
                        error = %e,
                        "Failed to remove stale staging file"
                    );
                }
            }
        }
        if purged > 0 {
            tracing::info!(purged, "Removed stale staging files");
        }
        Ok(purged)
    }
}

/// In-flight upload: a private staging file that becomes a published blob
/// on [`WriteHandle::commit`].
///
/// A handle dropped without commit removes its staging file, so error
/// return paths and client disconnects never leak staged bytes.
pub struct WriteHandle {
    file: Option<fs::File>,
    staging_file: PathBuf,
    blobs_path: PathBuf,
    bytes_written: u64,
    finished: bool,
}

impl WriteHandle {
    /// Append one chunk to the staged content.
    pub async fn write(&mut self, chunk: &[u8]) -> StorageResult<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| StorageError::WriteFailed("Write after commit/abort".to_string()))?;

        file.write_all(chunk).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to write staging file {}: {}",
                self.staging_file.display(),
                e
            ))
        })?;

        self.bytes_written += chunk.len() as u64;
        Ok(())
    }

    /// Total bytes staged so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Durably publish the staged content under `key`. Readers can observe
    /// the blob only after the rename; a crash before it leaves nothing but
    /// a staging file for the next reconciliation pass.
    pub async fn commit(mut self, key: &str) -> StorageResult<String> {
        validate_key(key)?;

        let start = std::time::Instant::now();
        let file = self
            .file
            .take()
            .ok_or_else(|| StorageError::WriteFailed("Commit after commit/abort".to_string()))?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to sync staging file {}: {}",
                self.staging_file.display(),
                e
            ))
        })?;
        drop(file);

        let target = self.blobs_path.join(key);
        fs::rename(&self.staging_file, &target).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to publish blob {}: {}",
                target.display(),
                e
            ))
        })?;
        self.finished = true;

        tracing::info!(
            key = %key,
            size_bytes = self.bytes_written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Blob committed"
        );

        Ok(key.to_string())
    }

    /// Discard the staged content.
    pub async fn abort(mut self) {
        self.file.take();
        if let Err(e) = fs::remove_file(&self.staging_file).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %self.staging_file.display(),
                    error = %e,
                    "Failed to remove aborted staging file"
                );
            }
        } else {
            tracing::debug!(path = %self.staging_file.display(), "Upload aborted, staging file discarded");
        }
        self.finished = true;
    }
}

impl Drop for WriteHandle {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // Close before unlinking; best-effort, the startup purge catches the rest.
        self.file.take();
        match std::fs::remove_file(&self.staging_file) {
            Ok(()) => {
                tracing::debug!(
                    path = %self.staging_file.display(),
                    "Discarded staging file for incomplete upload"
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %self.staging_file.display(),
                    error = %e,
                    "Failed to discard staging file"
                );
            }
        }
    }
}
