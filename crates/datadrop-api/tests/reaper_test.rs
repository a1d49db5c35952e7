//! Reaper integration tests: expiry sweeps and startup reconciliation.
//!
//! Run with: `cargo test -p datadrop-api --test reaper_test`

mod helpers;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use datadrop_api::Reaper;
use datadrop_core::{ShareEntry, ShareId};
use helpers::{setup_test_app, upload_expect_id, TestApp};

fn reaper_for(app: &TestApp) -> Reaper {
    Reaper::new(
        app.state.registry.clone(),
        app.state.blobs.clone(),
        StdDuration::from_secs(300),
    )
}

/// Publish a blob and register it with the given expiry offset.
async fn seed_share(app: &TestApp, expires_in: Duration) -> ShareId {
    let id = ShareId::generate();
    let mut handle = app.state.blobs.begin_write().await.unwrap();
    handle.write(b"seeded content").await.unwrap();
    let storage_key = handle.commit(id.as_str()).await.unwrap();

    let now = Utc::now();
    app.state
        .registry
        .put(ShareEntry {
            id: id.clone(),
            original_name: "seeded.txt".to_string(),
            size_bytes: 14,
            content_type: "text/plain".to_string(),
            created_at: now,
            expires_at: now + expires_in,
            storage_key,
        })
        .await
        .unwrap();

    id
}

#[tokio::test]
async fn test_sweep_reclaims_expired_shares_only() {
    let app = setup_test_app().await;
    let reaper = reaper_for(&app);

    let expired = seed_share(&app, Duration::hours(-1)).await;
    let live = seed_share(&app, Duration::hours(24)).await;

    let reclaimed = reaper.sweep().await.unwrap();
    assert_eq!(reclaimed, 1);

    // Expired share fully gone: entry and blob
    assert!(app.state.registry.get(expired.as_str()).await.is_none());
    assert!(!app.state.blobs.exists(expired.as_str()).await.unwrap());

    // Live share untouched
    assert!(app.state.registry.get(live.as_str()).await.is_some());
    assert!(app.state.blobs.exists(live.as_str()).await.unwrap());
}

#[tokio::test]
async fn test_expired_share_is_gone_end_to_end() {
    let app = setup_test_app().await;
    let reaper = reaper_for(&app);

    let id = seed_share(&app, Duration::hours(-1)).await;

    // Expired-but-unreaped already downloads as 404
    let response = app.server.get(&format!("/files/{}", id)).await;
    assert_eq!(response.status_code(), 404);

    reaper.sweep().await.unwrap();

    let response = app.server.get(&format!("/files/{}", id)).await;
    assert_eq!(response.status_code(), 404);
    assert!(!app.state.blobs.exists(id.as_str()).await.unwrap());
}

#[tokio::test]
async fn test_sweep_tolerates_already_deleted_blob() {
    let app = setup_test_app().await;
    let reaper = reaper_for(&app);

    let id = seed_share(&app, Duration::hours(-1)).await;
    app.state.blobs.delete(id.as_str()).await.unwrap();

    // Blob delete is idempotent, so the entry is still reclaimed
    let reclaimed = reaper.sweep().await.unwrap();
    assert_eq!(reclaimed, 1);
    assert!(app.state.registry.get(id.as_str()).await.is_none());
}

#[tokio::test]
async fn test_sweep_is_a_no_op_without_expired_shares() {
    let app = setup_test_app().await;
    let reaper = reaper_for(&app);

    let live = upload_expect_id(&app.server, "live.txt", "text/plain", b"still fresh").await;

    let reclaimed = reaper.sweep().await.unwrap();
    assert_eq!(reclaimed, 0);
    assert!(app.state.registry.get(&live).await.is_some());
}

#[tokio::test]
async fn test_reconcile_removes_orphans_and_staging_leftovers() {
    let app = setup_test_app().await;
    let reaper = reaper_for(&app);

    let registered = seed_share(&app, Duration::hours(24)).await;

    // A blob no registry entry owns (previous process life)
    let orphan = ShareId::generate();
    let mut handle = app.state.blobs.begin_write().await.unwrap();
    handle.write(b"orphaned").await.unwrap();
    handle.commit(orphan.as_str()).await.unwrap();

    // A staging file from an upload that never committed
    let mut stale = app.state.blobs.begin_write().await.unwrap();
    stale.write(b"interrupted").await.unwrap();
    std::mem::forget(stale);

    reaper.reconcile().await.unwrap();

    assert!(!app.state.blobs.exists(orphan.as_str()).await.unwrap());
    assert_eq!(app.state.blobs.purge_staging().await.unwrap(), 0);
    assert!(app.state.blobs.exists(registered.as_str()).await.unwrap());
}

#[tokio::test]
async fn test_started_reaper_sweeps_on_its_own() {
    let app = setup_test_app().await;

    let id = seed_share(&app, Duration::hours(-1)).await;

    let reaper = Arc::new(Reaper::new(
        app.state.registry.clone(),
        app.state.blobs.clone(),
        StdDuration::from_millis(50),
    ));
    let handle = reaper.start();

    // The first tick fires immediately; give it a few periods to run
    tokio::time::sleep(StdDuration::from_millis(300)).await;
    handle.abort();

    assert!(app.state.registry.get(id.as_str()).await.is_none());
    assert!(!app.state.blobs.exists(id.as_str()).await.unwrap());
}
