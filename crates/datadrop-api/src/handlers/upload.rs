use std::sync::Arc;

use axum::{
    extract::{multipart::Field, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use datadrop_core::validation::{normalize_content_type, sanitize_filename};
use datadrop_core::{AppError, ShareEntry, ShareId, ShareResponse};
use datadrop_storage::WriteHandle;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// A file part streamed to staging, not yet committed.
struct StagedUpload {
    handle: WriteHandle,
    original_name: String,
    content_type: String,
}

/// Upload a file for sharing
///
/// Accepts a multipart body with exactly one part named `file`, streams it
/// into blob staging while counting bytes, and registers the share only
/// after the content is durably committed. Any failure before commit
/// discards the staged bytes and registers nothing.
///
/// # Errors
/// - `AppError::BadRequest` - malformed multipart body, missing/duplicate
///   `file` part, empty file, or a client disconnect mid-stream
/// - `AppError::PayloadTooLarge` - file exceeds the configured size limit
/// - `AppError::Storage` - disk failure while staging or committing
#[utoipa::path(
    post,
    path = "/files",
    tag = "files",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File uploaded and shareable", body = ShareResponse),
        (status = 400, description = "Malformed upload", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_file"))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, HttpAppError> {
    let mut staged: Option<StagedUpload> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                // Covers malformed bodies and clients that vanish mid-stream.
                if let Some(upload) = staged.take() {
                    upload.handle.abort().await;
                }
                return Err(AppError::BadRequest(format!(
                    "Failed to read multipart body: {}",
                    e
                ))
                .into());
            }
        };

        if field.name() != Some("file") {
            continue;
        }
        if let Some(upload) = staged.take() {
            upload.handle.abort().await;
            return Err(AppError::BadRequest(
                "Multiple file fields are not allowed; send exactly one field named 'file'"
                    .to_string(),
            )
            .into());
        }

        staged = Some(stage_file_field(&state, field).await?);
    }

    let StagedUpload {
        handle,
        original_name,
        content_type,
    } = staged.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    if handle.bytes_written() == 0 {
        handle.abort().await;
        return Err(AppError::BadRequest("File is empty".to_string()).into());
    }

    let size_bytes = handle.bytes_written();
    let id = ShareId::generate();
    let storage_key = handle.commit(id.as_str()).await?;

    let now = Utc::now();
    let entry = ShareEntry {
        id: id.clone(),
        original_name,
        size_bytes,
        content_type,
        created_at: now,
        expires_at: now + state.config.retention_window(),
        storage_key,
    };

    if let Err(e) = state.registry.put(entry.clone()).await {
        // Should be unreachable: ids carry 128 bits of entropy. Drop the
        // just-committed blob so the two stores stay consistent.
        tracing::error!(share_id = %id, "Share id collision on registration");
        if let Err(del_err) = state.blobs.delete(id.as_str()).await {
            tracing::error!(share_id = %id, error = %del_err, "Failed to delete blob after collision");
        }
        return Err(e.into());
    }

    tracing::info!(
        share_id = %id,
        original_name = %entry.original_name,
        size_bytes = entry.size_bytes,
        expires_at = %entry.expires_at,
        "Share created"
    );

    let response = ShareResponse::from_entry(&entry, state.config.share_url(id.as_str()));
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Stream one `file` part into blob staging, enforcing the size limit
/// chunk-by-chunk so oversized uploads are cut off without buffering.
async fn stage_file_field(
    state: &AppState,
    mut field: Field<'_>,
) -> Result<StagedUpload, HttpAppError> {
    let original_name = sanitize_filename(field.file_name().unwrap_or("file"))?;
    let content_type = normalize_content_type(field.content_type());
    let max_bytes = state.config.max_file_size_bytes;

    let mut handle = state.blobs.begin_write().await?;

    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                if handle.bytes_written() + chunk.len() as u64 > max_bytes {
                    handle.abort().await;
                    return Err(AppError::PayloadTooLarge(format!(
                        "File exceeds the maximum allowed size of {} bytes",
                        max_bytes
                    ))
                    .into());
                }
                if let Err(e) = handle.write(&chunk).await {
                    handle.abort().await;
                    return Err(e.into());
                }
            }
            Ok(None) => break,
            Err(e) => {
                handle.abort().await;
                return Err(AppError::BadRequest(format!(
                    "Upload stream ended unexpectedly: {}",
                    e
                ))
                .into());
            }
        }
    }

    Ok(StagedUpload {
        handle,
        original_name,
        content_type,
    })
}
