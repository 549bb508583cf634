//! HTTP front end.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/api/health` | Service and model state |
//! | POST | `/analyze` | Classify an uploaded image and analyze its spectrum |
//! | POST | `/api/spectrum` | Spectral fingerprint figure as PNG |
//!
//! Uploads are multipart forms with the file in the `image` field.

mod api;
mod state;

pub use api::{AnalyzeResponse, SpectralSummary};
pub use state::AppState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    /// Analyses allowed to run at once; further requests wait.
    pub max_concurrent_analyses: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
            max_upload_bytes: 16 * 1024 * 1024,
            max_concurrent_analyses: 2,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        .route("/analyze", post(api::analyze))
        .route("/api/spectrum", post(api::spectrum))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
