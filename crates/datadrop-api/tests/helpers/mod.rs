//! Test helpers: build the production router against isolated storage.
//!
//! Run from workspace root: `cargo test -p datadrop-api --test transfer_test`
//! or `cargo test -p datadrop-api`.

// Not every test binary uses every helper
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum_test::{TestResponse, TestServer};
use datadrop_api::setup;
use datadrop_api::state::AppState;
use datadrop_core::Config;
use tempfile::TempDir;

pub const TEST_MAX_FILE_SIZE_BYTES: u64 = 1024 * 1024;

/// Test application: server, shared state, and the owned storage directory.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub _temp_dir: TempDir,
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Setup a test app with an isolated storage directory, applying `tweak`
/// to the config before initialization.
pub async fn setup_test_app_with(tweak: impl FnOnce(&mut Config)) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("create temp storage dir");

    let mut config = Config {
        server_port: 8080,
        public_base_url: "http://localhost:8080".to_string(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        storage_path: PathBuf::from(temp_dir.path()),
        retention_hours: 24,
        max_file_size_bytes: TEST_MAX_FILE_SIZE_BYTES,
        reaper_interval_secs: 300,
        environment: "test".to_string(),
    };
    tweak(&mut config);

    let (state, router) = setup::initialize_app(config)
        .await
        .expect("initialize test app");
    let server = TestServer::new(router).expect("start test server");

    TestApp {
        server,
        state,
        _temp_dir: temp_dir,
    }
}

pub const MULTIPART_BOUNDARY: &str = "datadrop-test-boundary";

/// Build a raw multipart/form-data body with a single part. Hand-rolled so
/// the tests exercise the real wire format, including its framing.
pub fn multipart_body(
    field_name: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{MULTIPART_BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field_name}\"; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    (
        format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        body,
    )
}

/// Upload `data` as a single `file` part and return the raw response.
pub async fn upload(
    server: &TestServer,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> TestResponse {
    let (request_content_type, body) = multipart_body("file", filename, content_type, data);
    server
        .post("/files")
        .content_type(&request_content_type)
        .bytes(body.into())
        .await
}

/// Upload and unwrap the share id from a 201 response.
pub async fn upload_expect_id(
    server: &TestServer,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> String {
    let response = upload(server, filename, content_type, data).await;
    assert_eq!(response.status_code(), 201, "upload should succeed");
    let body: serde_json::Value = response.json();
    body.get("id")
        .and_then(|v| v.as_str())
        .expect("upload response carries an id")
        .to_string()
}
