//! Health check handler.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::state::AppState;

/// Liveness probe - process is running and the registry answers.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let shares = state.registry.len().await;
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "ok", "shares": shares })),
    )
}
