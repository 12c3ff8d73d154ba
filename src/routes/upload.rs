//! Upload Routes
//!
//! HTTP endpoints for the chunked upload lifecycle.
//!
//! Endpoints:
//! - POST /api/v1/upload/chunk - Upload a single chunk (multipart form)
//! - POST /api/v1/upload/finalize - Reassemble, post-process and store
//! - GET /api/v1/upload/:session_id - Get session status
//! - DELETE /api/v1/upload/:session_id - Cancel an in-progress session

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::upload::{ChunkUploadResponse, FinalizeRequest, FinalizeResponse, MAX_CHUNK_SIZE};

/// Create the upload router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chunk", post(upload_chunk))
        .route("/finalize", post(finalize))
        .route("/:session_id", get(session_status))
        .route("/:session_id", delete(cancel_session))
        // multipart framing overhead on top of the largest accepted chunk
        .layer(DefaultBodyLimit::max(MAX_CHUNK_SIZE + 64 * 1024))
}

/// POST /api/v1/upload/chunk
///
/// Accepts a multipart form with `sessionId` and `chunkIndex` text fields
/// and a `chunk` file field carrying the raw bytes, matching the browser
/// client's FormData layout.
async fn upload_chunk(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ChunkUploadResponse>> {
    let mut session_id: Option<String> = None;
    let mut chunk_index: Option<usize> = None;
    let mut data: Option<axum::body::Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "sessionId" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(e.to_string()))?;
                session_id = Some(value);
            }
            "chunkIndex" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(e.to_string()))?;
                let index = value.trim().parse::<usize>().map_err(|_| {
                    AppError::InvalidInput(format!("Invalid chunk index: {:?}", value))
                })?;
                chunk_index = Some(index);
            }
            "chunk" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(e.to_string()))?;
                data = Some(bytes);
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
            }
        }
    }

    let session_id = session_id
        .ok_or_else(|| AppError::InvalidInput("Missing sessionId field".to_string()))?;
    let chunk_index = chunk_index
        .ok_or_else(|| AppError::InvalidInput("Missing chunkIndex field".to_string()))?;
    let data =
        data.ok_or_else(|| AppError::InvalidInput("Missing chunk field".to_string()))?;

    let chunks_received = state
        .uploads()
        .put_chunk(&session_id, chunk_index, &data)
        .await?;

    tracing::debug!(
        session_id = %session_id,
        chunk_index = chunk_index,
        chunks_received = chunks_received,
        "Chunk uploaded"
    );

    Ok(Json(ChunkUploadResponse {
        chunk_index,
        chunks_received,
    }))
}

/// POST /api/v1/upload/finalize
async fn finalize(
    State(state): State<AppState>,
    Json(request): Json<FinalizeRequest>,
) -> Result<Json<FinalizeResponse>> {
    let stored = state
        .uploads()
        .finalize(&request.session_id, request.total_chunks, &request.file_name)
        .await?;

    Ok(Json(FinalizeResponse {
        file_name: stored.name,
        size: stored.size,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionStatusResponse {
    session_id: String,
    chunks_received: usize,
    created_at: DateTime<Utc>,
}

/// GET /api/v1/upload/:session_id
async fn session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStatusResponse>> {
    let session = state.uploads().session_status(&session_id).await?;

    Ok(Json(SessionStatusResponse {
        session_id: session.id,
        chunks_received: session.received_chunks.len(),
        created_at: session.created_at,
    }))
}

/// DELETE /api/v1/upload/:session_id
async fn cancel_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<axum::http::StatusCode> {
    state.uploads().cancel(&session_id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
