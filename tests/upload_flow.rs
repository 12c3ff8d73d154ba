//! End-to-end tests for the chunked upload flow over HTTP.

use std::io::Write;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use meshdrop_server::config::Config;
use meshdrop_server::state::AppState;

const BOUNDARY: &str = "meshdrop-test-boundary";

async fn test_app(temp_dir: &TempDir) -> Router {
    let mut config = Config::default();
    config.storage.chunk_dir = temp_dir.path().join("tmp");
    config.storage.model_dir = temp_dir.path().join("models");
    // keep tests hermetic: no external optimizer binary
    config.optimizer.enabled = false;

    meshdrop_server::app(AppState::new(config).await)
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn multipart_chunk_body(session_id: &str, chunk_index: usize, chunk: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    let mut text_part = |name: &str, value: &str| {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    };
    text_part("sessionId", session_id);
    text_part("chunkIndex", &chunk_index.to_string());

    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"chunk\"; filename=\"blob\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(chunk);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn upload_chunk(app: &Router, session_id: &str, index: usize, chunk: &[u8]) -> StatusCode {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/upload/chunk")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_chunk_body(session_id, index, chunk)))
        .unwrap();

    app.clone().oneshot(request).await.unwrap().status()
}

async fn finalize(app: &Router, session_id: &str, total_chunks: usize, file_name: &str) -> (StatusCode, Value) {
    let payload = serde_json::json!({
        "sessionId": session_id,
        "totalChunks": total_chunks,
        "fileName": file_name,
    });

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/upload/finalize")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_chunked_upload_and_download_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir).await;

    // a payload large enough to span several chunks
    let model: Vec<u8> = (0..100_000u32).flat_map(|i| i.to_le_bytes()).collect();
    let compressed = gzip(&model);

    let chunk_size = 64 * 1024;
    let chunks: Vec<&[u8]> = compressed.chunks(chunk_size).collect();
    assert!(chunks.len() > 1);

    // upload in reverse order; reassembly must still be index-ordered
    for (i, chunk) in chunks.iter().enumerate().rev() {
        let status = upload_chunk(&app, "session-abc", i, chunk).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, json) = finalize(&app, "session-abc", chunks.len(), "scene.glb").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["fileName"], "scene.glb");
    assert_eq!(json["size"].as_u64().unwrap(), model.len() as u64);

    // the stored model is the decompressed original
    let request = Request::builder()
        .uri("/api/v1/models/scene.glb")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "model/gltf-binary"
    );
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=31536000, immutable"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(bytes.as_ref(), model.as_slice());

    // and it shows up in the listing
    let (status, json) = get_json(&app, "/api/v1/models").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 1);
    assert_eq!(json["models"][0]["name"], "scene.glb");
}

#[tokio::test]
async fn test_finalize_with_missing_chunk_reports_index() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir).await;

    assert_eq!(upload_chunk(&app, "s1", 0, b"aaa").await, StatusCode::OK);
    assert_eq!(upload_chunk(&app, "s1", 2, b"ccc").await, StatusCode::OK);

    let (status, json) = finalize(&app, "s1", 3, "scene.glb").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INCOMPLETE_UPLOAD");
    assert!(json["error"].as_str().unwrap().contains('1'));

    // nothing was committed
    let (_, json) = get_json(&app, "/api/v1/models").await;
    assert_eq!(json["total"], 0);
}

#[tokio::test]
async fn test_finalize_unknown_session_is_404() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir).await;

    let (status, json) = finalize(&app, "nope", 1, "scene.glb").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn test_duplicate_names_get_counter_suffixes() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir).await;

    for (session, expected) in [("a", "model.glb"), ("b", "model_1.glb"), ("c", "model_2.glb")] {
        assert_eq!(upload_chunk(&app, session, 0, b"bytes").await, StatusCode::OK);
        let (status, json) = finalize(&app, session, 1, "model.glb").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["fileName"], expected);
    }
}

#[tokio::test]
async fn test_malformed_chunk_request_is_400() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir).await;

    // missing the chunk field entirely
    let mut body = Vec::new();
    body.extend_from_slice(
        format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"sessionId\"\r\n\r\ns1\r\n--{BOUNDARY}--\r\n")
            .as_bytes(),
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/upload/chunk")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unsafe_model_name_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir).await;

    // backslash smuggled through a path segment
    let (status, json) = get_json(&app, "/api/v1/models/a%5Cb.glb").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_delete_model() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir).await;

    assert_eq!(upload_chunk(&app, "s1", 0, b"bytes").await, StatusCode::OK);
    let (status, _) = finalize(&app, "s1", 1, "scene.glb").await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/v1/models/scene.glb")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, json) = get_json(&app, "/api/v1/models").await;
    assert_eq!(json["total"], 0);

    // deleting again is a 404
    let request = Request::builder()
        .method("DELETE")
        .uri("/api/v1/models/scene.glb")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_status_and_cancel() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir).await;

    assert_eq!(upload_chunk(&app, "s1", 0, b"a").await, StatusCode::OK);
    assert_eq!(upload_chunk(&app, "s1", 1, b"b").await, StatusCode::OK);

    let (status, json) = get_json(&app, "/api/v1/upload/s1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["chunksReceived"], 2);

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/v1/upload/s1")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, _) = get_json(&app, "/api/v1/upload/s1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_check() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir).await;

    let (status, json) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}
