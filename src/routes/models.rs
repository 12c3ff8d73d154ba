//! Model serving routes
//!
//! Lists, serves and deletes finalized model files from the registry.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::registry::ModelInfo;
use crate::state::AppState;

/// Create the models router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_models))
        .route("/:name", get(serve_model).delete(delete_model))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModelListResponse {
    models: Vec<ModelInfo>,
    total: usize,
}

/// GET /api/v1/models
///
/// Lists stored models, most recently modified first.
async fn list_models(State(state): State<AppState>) -> Result<Json<ModelListResponse>> {
    let models = state.registry().list().await?;
    let total = models.len();

    Ok(Json(ModelListResponse { models, total }))
}

/// GET /api/v1/models/:name
///
/// Serves a stored model. Finalized models are immutable, so clients are
/// told to cache them aggressively.
async fn serve_model(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response> {
    let data = state.registry().read(&name).await?;
    let size = data.len();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "model/gltf-binary")
        .header(header::CONTENT_LENGTH, size)
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", name),
        )
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(e.to_string()))
}

#[derive(Serialize)]
struct DeleteResponse {
    message: String,
}

/// DELETE /api/v1/models/:name
async fn delete_model(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.registry().delete(&name).await?;

    Ok(Json(DeleteResponse {
        message: format!("Deleted {}", name),
    }))
}
