//! Application state.
//!
//! One context object built at startup and shared by the transfer handlers
//! and the reaper for the process lifetime.

use std::sync::Arc;

use datadrop_core::Config;
use datadrop_registry::ShareRegistry;
use datadrop_storage::BlobStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub registry: Arc<ShareRegistry>,
    pub blobs: Arc<BlobStore>,
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
