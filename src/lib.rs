use std::path::Path;

use image::{DynamicImage, GenericImageView};

use crate::{
    analysis::fingerprint::{PatternVerdict, SpectralFingerprint, SpectralFingerprintAnalyzer},
    config::DetectorConfig,
    detection::{DetectionResult, engine::DetectionEngine},
    error::Result,
    image_utils::to_grayscale,
    report::visualization::Visualizer,
};

pub mod analysis;
pub mod config;
pub mod detection;
pub mod error;
pub mod image_utils;
pub mod report;
pub mod web;

/// One loaded image and everything that can be asked about it.
pub struct ImageInspector {
    original: DynamicImage,
    analyzer: SpectralFingerprintAnalyzer,
    path: Option<String>,
}

impl ImageInspector {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let original = image::open(&path)?;

        Ok(Self {
            original,
            analyzer: SpectralFingerprintAnalyzer::new(),
            path: Some(path_str),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_image(image::load_from_memory(bytes)?))
    }

    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            original: image,
            analyzer: SpectralFingerprintAnalyzer::new(),
            path: None,
        }
    }

    pub fn with_config(self, config: &DetectorConfig) -> Self {
        let analyzer = SpectralFingerprintAnalyzer::with_config(config.spectral.clone())
            .with_visualizer(Visualizer::with_config(config.visualization.clone()));
        self.with_analyzer(analyzer)
    }

    pub fn with_analyzer(mut self, analyzer: SpectralFingerprintAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.original
    }

    pub fn fingerprint(&self) -> Result<SpectralFingerprint> {
        self.analyzer.fingerprint_image(&self.original)
    }

    pub fn analyze_patterns(&self) -> Result<PatternVerdict> {
        self.analyzer.analyze_image(&self.original)
    }

    pub fn classify(&self, engine: &DetectionEngine) -> Result<DetectionResult> {
        engine.detect_or_unavailable(&self.original)
    }

    /// Classifier verdict plus spectral fingerprint, sharing one transform.
    pub fn full_analysis(&self, engine: &DetectionEngine) -> Result<FullAnalysisReport> {
        let (width, height) = self.original.dimensions();
        let fingerprint = self.analyzer.fingerprint_gray(&to_grayscale(&self.original))?;
        let patterns = self.analyzer.analyze_spectrum(&fingerprint.spectrum)?;
        let detection = self.classify(engine)?;

        Ok(FullAnalysisReport {
            width,
            height,
            fingerprint,
            patterns,
            detection,
        })
    }
}

#[derive(Debug)]
pub struct FullAnalysisReport {
    pub width: u32,
    pub height: u32,
    pub fingerprint: SpectralFingerprint,
    pub patterns: PatternVerdict,
    pub detection: DetectionResult,
}
