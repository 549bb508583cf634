//! spectral-web - HTTP service for AI image detection.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use spectral_detect::{
    analysis::fingerprint::SpectralFingerprintAnalyzer,
    config::DetectorConfig,
    detection::{engine::DetectionEngine, huggingface::HuggingFaceLoader},
    report::visualization::Visualizer,
    web::{AppState, create_router},
};

#[derive(Parser, Debug)]
#[command(name = "spectral-web")]
#[command(about = "AI image detection service with spectral fingerprint analysis")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => DetectorConfig::load_from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => DetectorConfig::default(),
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }

    let engine = Arc::new(DetectionEngine::with_config(
        Box::new(HuggingFaceLoader::with_config(config.huggingface.clone())),
        config.models.clone(),
    ));

    // The service stays up without a model; /analyze then reports it unavailable.
    let init_engine = Arc::clone(&engine);
    match tokio::task::spawn_blocking(move || init_engine.initialize()).await? {
        Ok(model) => info!("Detection model ready: {}", model),
        Err(e) => warn!("{}", e),
    }

    let analyzer = SpectralFingerprintAnalyzer::with_config(config.spectral.clone())
        .with_visualizer(Visualizer::with_config(config.visualization.clone()));
    let state = AppState::new(analyzer, engine, config.server.max_concurrent_analyses);
    let app = create_router(state, &config.server);

    let addr = config.server.address();
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
