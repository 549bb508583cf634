//! Request handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use log::{error, info};
use serde::Serialize;
use serde_json::json;

use crate::{error::DetectorError, web::state::AppState};

/// Error reply rendered as `{"error": "..."}`.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<DetectorError> for ApiError {
    fn from(err: DetectorError) -> Self {
        error!("Error processing image: {}", err);
        Self::internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct SpectralSummary {
    pub verdict: String,
    pub anomalous: bool,
    pub anomaly_count: usize,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub detection: String,
    pub is_ai: bool,
    pub confidence: f64,
    pub model: Option<String>,
    pub spectral: SpectralSummary,
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "model_ready": state.engine.is_ready(),
        "model": state.engine.state_description(),
        "available_slots": state.available_slots(),
    }))
}

async fn read_upload(mut multipart: Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError {
        status: e.status(),
        message: e.body_text(),
    })? {
        if field.name() != Some("image") {
            continue;
        }

        // A part without a filename is a plain form value, not an upload.
        match field.file_name() {
            None => continue,
            Some("") => return Err(ApiError::bad_request("No selected file")),
            Some(_) => {}
        }

        return field.bytes().await.map_err(|e| ApiError {
            status: e.status(),
            message: e.body_text(),
        });
    }

    Err(ApiError::bad_request("No image file provided"))
}

pub async fn analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let bytes = read_upload(multipart).await?;
    let permit = state
        .acquire_slot()
        .await
        .ok_or_else(|| ApiError::internal("Analysis queue closed"))?;

    let worker = state.clone();
    let response = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        let image = image::load_from_memory(&bytes)?;
        let detection = worker.engine.detect_or_unavailable(&image)?;
        let patterns = worker.analyzer.analyze_image(&image)?;

        Ok::<_, DetectorError>(AnalyzeResponse {
            success: true,
            detection: detection.formatted(),
            is_ai: detection.is_artificial(),
            confidence: detection.confidence,
            model: detection.model_used.clone(),
            spectral: SpectralSummary {
                verdict: patterns.message(),
                anomalous: patterns.anomalous,
                anomaly_count: patterns.statistics.anomaly_count,
            },
        })
    })
    .await
    .map_err(|e| ApiError::internal(e.to_string()))??;

    info!(
        "Analyzed upload: {} / spectral anomalies {}",
        response.detection, response.spectral.anomaly_count
    );

    Ok(Json(response))
}

pub async fn spectrum(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let bytes = read_upload(multipart).await?;
    let permit = state
        .acquire_slot()
        .await
        .ok_or_else(|| ApiError::internal("Analysis queue closed"))?;

    let analyzer = state.analyzer.clone();
    let png = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        analyzer.fingerprint_bytes(&bytes)?.to_png()
    })
    .await
    .map_err(|e| ApiError::internal(e.to_string()))??;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}
