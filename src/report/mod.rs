pub mod glyphs;
pub mod visualization;

use base64::{Engine as _, engine::general_purpose};
use serde::Serialize;

use crate::{FullAnalysisReport, error::Result, image_utils::encode_png};

#[derive(Serialize)]
pub struct JsonReport {
    pub width: u32,
    pub height: u32,
    pub detection: DetectionReportSection,
    pub spectral_analysis: SpectralReportSection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spectrum_png_base64: Option<String>,
}

#[derive(Serialize)]
pub struct DetectionReportSection {
    pub summary: String,
    pub is_ai: bool,
    pub provenance: String,
    pub confidence: f64,
    pub model_used: Option<String>,
    pub ambiguous: bool,
}

#[derive(Serialize)]
pub struct SpectralReportSection {
    pub verdict: String,
    pub anomalous: bool,
    pub anomaly_count: usize,
    pub anomaly_threshold: f64,
    pub mean_magnitude: f64,
    pub std_deviation: f64,
    pub max_magnitude: f64,
    pub exclusion_radius: usize,
}

impl JsonReport {
    pub fn from_report(report: &FullAnalysisReport, include_figure: bool) -> Result<Self> {
        let spectrum_png_base64 = if include_figure {
            let png = encode_png(&report.fingerprint.figure)?;
            Some(general_purpose::STANDARD.encode(png))
        } else {
            None
        };

        let stats = &report.patterns.statistics;

        Ok(Self {
            width: report.width,
            height: report.height,
            detection: DetectionReportSection {
                summary: report.detection.formatted(),
                is_ai: report.detection.is_artificial(),
                provenance: report.detection.provenance.to_string(),
                confidence: report.detection.confidence,
                model_used: report.detection.model_used.clone(),
                ambiguous: report.detection.ambiguous,
            },
            spectral_analysis: SpectralReportSection {
                verdict: report.patterns.message(),
                anomalous: report.patterns.anomalous,
                anomaly_count: stats.anomaly_count,
                anomaly_threshold: stats.threshold,
                mean_magnitude: stats.mean,
                std_deviation: stats.std_deviation,
                max_magnitude: stats.max,
                exclusion_radius: stats.exclusion_radius,
            },
            spectrum_png_base64,
        })
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
