//! Application setup and initialization
//!
//! All initialization logic lives here rather than in main.rs so the
//! integration tests can build the exact production router against an
//! isolated storage directory.

pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::{Context, Result};
use datadrop_core::Config;
use datadrop_registry::ShareRegistry;
use datadrop_storage::BlobStore;

use crate::state::AppState;

/// Initialize the application: validate config, open storage, build state
/// and routes.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    let blobs = Arc::new(
        BlobStore::new(&config.storage_path)
            .await
            .context("Failed to open blob storage")?,
    );
    let registry = Arc::new(ShareRegistry::new());

    let state = Arc::new(AppState {
        config: config.clone(),
        registry,
        blobs,
    });

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
