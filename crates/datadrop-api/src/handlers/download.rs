use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use datadrop_core::{AppError, ShareId};
use datadrop_storage::StorageError;
use futures::StreamExt;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Download a shared file
///
/// Streams the blob back without buffering it in memory. Expired entries
/// that the reaper has not visited yet are indistinguishable from unknown
/// ids, as is anything that does not parse as a share id.
#[utoipa::path(
    get,
    path = "/files/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "Share identifier returned by the upload")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "Unknown or expired share", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = ShareId::parse(&raw_id)
        .ok_or_else(|| AppError::NotFound("Share not found".to_string()))?;

    let entry = state
        .registry
        .get(id.as_str())
        .await
        .ok_or_else(|| AppError::NotFound("Share not found".to_string()))?;

    if entry.is_expired(Utc::now()) {
        tracing::debug!(share_id = %id, expires_at = %entry.expires_at, "Rejected download of expired share");
        return Err(AppError::NotFound("Share not found".to_string()).into());
    }

    let stream = match state.blobs.open_read(&entry.storage_key).await {
        Ok(stream) => stream,
        Err(StorageError::NotFound(_)) => {
            // Registry and disk disagree (reaper race or external
            // interference); drop the stale entry so the id stops resolving.
            tracing::warn!(
                share_id = %id,
                storage_key = %entry.storage_key,
                "Registered blob missing from storage, removing stale entry"
            );
            state.registry.remove(id.as_str()).await;
            return Err(AppError::NotFound("Share not found".to_string()).into());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::debug!(share_id = %id, storage_key = %entry.storage_key, "Streaming blob to client");

    let body_stream = stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, entry.content_type)
        .header(header::CONTENT_LENGTH, entry.size_bytes)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", entry.original_name),
        )
        .body(Body::from_stream(body_stream))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(response)
}
