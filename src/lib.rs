//! Meshdrop Server Library
//!
//! Chunked upload, post-processing and serving of 3D model assets. The
//! server binary lives in main.rs; this crate root exposes the application
//! modules and the router for integration tests.

use axum::{routing::get, Router};

pub mod config;
pub mod error;
pub mod optimizer;
pub mod registry;
pub mod routes;
pub mod state;
pub mod upload;

use state::AppState;

/// Build the application router over the given state.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1/upload", routes::upload::router())
        .nest("/api/v1/models", routes::models::router())
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
