//! Shared state handed to every request handler.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::{analysis::fingerprint::SpectralFingerprintAnalyzer, detection::engine::DetectionEngine};

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<SpectralFingerprintAnalyzer>,
    pub engine: Arc<DetectionEngine>,
    limiter: Arc<Semaphore>,
}

impl AppState {
    pub fn new(
        analyzer: SpectralFingerprintAnalyzer,
        engine: Arc<DetectionEngine>,
        max_concurrent_analyses: usize,
    ) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            engine,
            limiter: Arc::new(Semaphore::new(max_concurrent_analyses.max(1))),
        }
    }

    /// Waits for an analysis slot. The slot is released when the permit drops.
    pub async fn acquire_slot(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.limiter).acquire_owned().await.ok()
    }

    pub fn available_slots(&self) -> usize {
        self.limiter.available_permits()
    }
}
