//! Background reclamation of expired shares.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use datadrop_registry::ShareRegistry;
use datadrop_storage::BlobStore;
use tokio::time::interval;

/// Periodic sweep over the registry: expired shares have their blob deleted
/// first and their registry entry removed second, so an interruption between
/// the two steps leaves only an already-deleted entry for the next cycle to
/// skip, never an unowned blob.
pub struct Reaper {
    registry: Arc<ShareRegistry>,
    blobs: Arc<BlobStore>,
    sweep_interval: Duration,
}

impl Reaper {
    pub fn new(
        registry: Arc<ShareRegistry>,
        blobs: Arc<BlobStore>,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            registry,
            blobs,
            sweep_interval,
        }
    }

    /// Start the background sweep task.
    /// Returns a JoinHandle so shutdown can cancel the next cycle.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(self.sweep_interval);

            loop {
                sweep_interval.tick().await;

                match self.sweep().await {
                    Ok(reclaimed) => {
                        tracing::info!(reclaimed, "Sweep completed");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Sweep failed");
                    }
                }
            }
        })
    }

    /// Reclaim every expired share. Failures are isolated per entry: a blob
    /// that cannot be deleted keeps its registry entry and is retried on the
    /// next cycle.
    #[tracing::instrument(skip(self), fields(reaper.operation = "sweep"))]
    pub async fn sweep(&self) -> Result<usize, anyhow::Error> {
        let now = Utc::now();
        let expired = self.registry.list_expired(now).await;
        let mut reclaimed = 0;

        for entry in expired {
            tracing::info!(
                share_id = %entry.id,
                storage_key = %entry.storage_key,
                expires_at = %entry.expires_at,
                "Deleting expired share"
            );

            match self.blobs.delete(&entry.storage_key).await {
                Ok(()) => {
                    tracing::debug!(storage_key = %entry.storage_key, "Blob removed from storage");
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        storage_key = %entry.storage_key,
                        "Failed to delete blob, keeping entry for retry"
                    );
                    continue;
                }
            }

            self.registry.remove(entry.id.as_str()).await;
            reclaimed += 1;
        }

        Ok(reclaimed)
    }

    /// One-off startup pass: drop staging leftovers from interrupted uploads
    /// and delete every on-disk blob with no registry entry.
    #[tracing::instrument(skip(self), fields(reaper.operation = "reconcile"))]
    pub async fn reconcile(&self) -> Result<(), anyhow::Error> {
        let purged_staging = self.blobs.purge_staging().await?;

        let registered: HashSet<String> = self.registry.ids().await.into_iter().collect();
        let mut orphaned = 0;
        for key in self.blobs.list_keys().await? {
            if registered.contains(&key) {
                continue;
            }
            match self.blobs.delete(&key).await {
                Ok(()) => orphaned += 1,
                Err(e) => {
                    tracing::warn!(error = %e, key = %key, "Failed to delete orphaned blob");
                }
            }
        }

        tracing::info!(
            purged_staging,
            orphaned,
            "Startup reconciliation completed"
        );

        Ok(())
    }
}
