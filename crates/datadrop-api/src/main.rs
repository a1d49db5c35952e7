use std::sync::Arc;
use std::time::Duration;

use datadrop_api::{setup, telemetry, Reaper};
use datadrop_core::Config;

// Use mimalloc as the global allocator for better performance and lower fragmentation,
// especially when running on musl-based systems inside containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    telemetry::init_telemetry()
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    // Initialize the application (storage, registry, routes)
    let (state, router) = setup::initialize_app(config.clone()).await?;

    // Reclaim whatever a previous process life left behind, then start the
    // periodic sweep.
    let reaper = Arc::new(Reaper::new(
        state.registry.clone(),
        state.blobs.clone(),
        Duration::from_secs(config.reaper_interval_secs),
    ));
    if let Err(e) = reaper.reconcile().await {
        tracing::error!(error = %e, "Startup reconciliation failed");
    }
    let reaper_handle = reaper.start();

    // Start the server; returns after graceful shutdown drains in-flight requests
    setup::server::start_server(&config, router).await?;

    // The reaper's next cycle is simply not run.
    reaper_handle.abort();
    tracing::info!("Reaper stopped");

    Ok(())
}
