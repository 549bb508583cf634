mod common;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use common::StubLoader;
use http_body_util::BodyExt;
use image::RgbImage;
use serde_json::Value;
use spectral_detect::{
    analysis::fingerprint::SpectralFingerprintAnalyzer,
    detection::engine::DetectionEngine,
    image_utils::encode_png,
    web::{AppState, ServerConfig, create_router},
};
use tower::ServiceExt;

const BOUNDARY: &str = "spectral-test-boundary";

fn state_with(engine: DetectionEngine, config: &ServerConfig) -> AppState {
    AppState::new(
        SpectralFingerprintAnalyzer::new(),
        Arc::new(engine),
        config.max_concurrent_analyses,
    )
}

fn app(engine: DetectionEngine) -> Router {
    let config = ServerConfig::default();
    create_router(state_with(engine, &config), &config)
}

fn ready_engine() -> DetectionEngine {
    let loader = StubLoader::default()
        .with_model("umm-maybe/AI-image-detector", &[("artificial", 0.9), ("human", 0.1)]);
    let engine = DetectionEngine::new(Box::new(loader));
    engine.initialize().unwrap();
    engine
}

fn unloaded_engine() -> DetectionEngine {
    DetectionEngine::new(Box::new(StubLoader::default()))
}

fn flat_png() -> Vec<u8> {
    encode_png(&RgbImage::from_pixel(32, 32, image::Rgb([120, 120, 120]))).unwrap()
}

fn multipart_body(field: &str, filename: Option<&str>, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    match filename {
        Some(name) => body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
                field, name
            )
            .as_bytes(),
        ),
        None => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", field).as_bytes(),
        ),
    }
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_model_state() {
    let response = app(ready_engine())
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["model_ready"], true);
    assert_eq!(json["model"], "ready (umm-maybe/AI-image-detector)");
    assert_eq!(json["available_slots"], 2);
}

#[tokio::test]
async fn analyze_returns_detection_and_spectral_verdict() {
    let body = multipart_body("image", Some("flat.png"), &flat_png());
    let response = app(ready_engine())
        .oneshot(upload("/analyze", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["detection"], "90.0% Artificial");
    assert_eq!(json["is_ai"], true);
    assert_eq!(json["model"], "umm-maybe/AI-image-detector");
    assert_eq!(json["spectral"]["anomalous"], false);
    assert_eq!(json["spectral"]["anomaly_count"], 0);
    assert_eq!(
        json["spectral"]["verdict"],
        "✓ Spectral pattern appears natural.\nNo significant high-frequency artifacts found."
    );
}

#[tokio::test]
async fn analyze_without_model_still_reports_spectrum() {
    let body = multipart_body("image", Some("flat.png"), &flat_png());
    let response = app(unloaded_engine())
        .oneshot(upload("/analyze", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["detection"], "Model unavailable");
    assert_eq!(json["is_ai"], false);
    assert_eq!(json["confidence"], 0.0);
    assert!(json["model"].is_null());
    assert_eq!(json["spectral"]["anomalous"], false);
}

#[tokio::test]
async fn missing_image_field_is_rejected() {
    let body = multipart_body("caption", None, b"holiday");
    let response = app(ready_engine())
        .oneshot(upload("/analyze", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No image file provided");
}

#[tokio::test]
async fn image_part_without_filename_counts_as_missing() {
    let body = multipart_body("image", None, &flat_png());
    let response = app(ready_engine())
        .oneshot(upload("/analyze", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No image file provided");
}

#[tokio::test]
async fn empty_filename_is_rejected() {
    let body = multipart_body("image", Some(""), &flat_png());
    let response = app(ready_engine())
        .oneshot(upload("/analyze", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No selected file");
}

#[tokio::test]
async fn undecodable_upload_is_a_server_error() {
    let body = multipart_body("image", Some("broken.png"), b"not an image at all");
    let response = app(ready_engine())
        .oneshot(upload("/analyze", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert!(json["error"].as_str().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn spectrum_endpoint_returns_png_figure() {
    let body = multipart_body("image", Some("flat.png"), &flat_png());
    let response = app(unloaded_engine())
        .oneshot(upload("/api/spectrum", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let figure = image::load_from_memory(&bytes).unwrap();
    assert_eq!((figure.width(), figure.height()), (600, 600));
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let config = ServerConfig {
        max_upload_bytes: 1024,
        ..ServerConfig::default()
    };
    let router = create_router(state_with(ready_engine(), &config), &config);

    let body = multipart_body("image", Some("large.png"), &vec![0u8; 4096]);
    let response = router.oneshot(upload("/analyze", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn analysis_waits_for_a_free_slot() {
    let config = ServerConfig {
        max_concurrent_analyses: 1,
        ..ServerConfig::default()
    };
    let state = state_with(ready_engine(), &config);
    let router = create_router(state.clone(), &config);

    let held = state.acquire_slot().await.unwrap();
    assert_eq!(state.available_slots(), 0);

    let health = router
        .clone()
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(json_body(health).await["available_slots"], 0);

    let body = multipart_body("image", Some("flat.png"), &flat_png());
    let blocked = tokio::time::timeout(
        Duration::from_millis(200),
        router.clone().oneshot(upload("/analyze", body)),
    )
    .await;
    assert!(blocked.is_err(), "analysis ran without a free slot");

    drop(held);
    assert_eq!(state.available_slots(), 1);

    let body = multipart_body("image", Some("flat.png"), &flat_png());
    let response = router.oneshot(upload("/analyze", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.available_slots(), 1);
}
