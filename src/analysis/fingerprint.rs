use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use log::debug;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::{
    analysis::spectrum::MagnitudeSpectrum,
    error::{DetectorError, Result},
    image_utils::{decode_grayscale, encode_png, load_grayscale, to_grayscale},
    report::visualization::Visualizer,
};

/// Returned by front ends in place of a verdict when the image cannot be read.
pub const UNANALYZABLE_MESSAGE: &str = "Could not analyze image";

const ANOMALOUS_LINES: [&str; 2] = [
    "⚠ High number of spectral anomalies detected.",
    "This is a common characteristic of GAN/Diffusion generation.",
];

const NATURAL_LINES: [&str; 2] = [
    "✓ Spectral pattern appears natural.",
    "No significant high-frequency artifacts found.",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    /// Exclusion radius is `min(center_row, center_col) / radius_divisor`.
    pub radius_divisor: usize,
    pub sigma_multiplier: f64,
    /// Verdict turns anomalous once the outlier count exceeds this.
    pub anomaly_count_threshold: usize,
    /// Outer magnitudes below `noise_floor_ratio * peak` count as zero.
    pub noise_floor_ratio: f64,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            radius_divisor: 4,
            sigma_multiplier: 3.0,
            anomaly_count_threshold: 100,
            noise_floor_ratio: 1e-9,
        }
    }
}

/// Cells lying strictly outside the central exclusion disc.
#[derive(Debug, Clone)]
pub struct AnnulusMask {
    mask: Array2<bool>,
    center: (usize, usize),
    radius: usize,
}

impl AnnulusMask {
    pub fn new(height: usize, width: usize, radius_divisor: usize) -> Self {
        let center = (height / 2, width / 2);
        let radius = center.0.min(center.1) / radius_divisor.max(1);
        let radius_sq = (radius * radius) as i64;

        let mask = Array2::from_shape_fn((height, width), |(y, x)| {
            let dy = y as i64 - center.0 as i64;
            let dx = x as i64 - center.1 as i64;
            dy * dy + dx * dx > radius_sq
        });

        Self { mask, center, radius }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn center(&self) -> (usize, usize) {
        self.center
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.mask.get((row, col)).copied().unwrap_or(false)
    }

    pub fn count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    pub fn select(&self, values: &Array2<f64>) -> Vec<f64> {
        values
            .iter()
            .zip(self.mask.iter())
            .filter(|(_, m)| **m)
            .map(|(&v, _)| v)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpectralStatistics {
    pub mean: f64,
    pub std_deviation: f64,
    pub max: f64,
    pub threshold: f64,
    pub anomaly_count: usize,
    pub outer_cells: usize,
    pub exclusion_radius: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternVerdict {
    pub anomalous: bool,
    pub statistics: SpectralStatistics,
}

impl PatternVerdict {
    pub fn lines(&self) -> [&'static str; 2] {
        if self.anomalous {
            ANOMALOUS_LINES
        } else {
            NATURAL_LINES
        }
    }

    pub fn message(&self) -> String {
        self.lines().join("\n")
    }
}

#[derive(Debug, Clone)]
pub struct SpectralFingerprint {
    pub spectrum: MagnitudeSpectrum,
    pub log_magnitude: Array2<f64>,
    pub figure: RgbImage,
}

impl SpectralFingerprint {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.figure.save(path)?;
        Ok(())
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        encode_png(&self.figure)
    }
}

pub struct SpectralFingerprintAnalyzer {
    config: SpectralConfig,
    visualizer: Visualizer,
}

impl SpectralFingerprintAnalyzer {
    pub fn new() -> Self {
        Self::with_config(SpectralConfig::default())
    }

    pub fn with_config(config: SpectralConfig) -> Self {
        Self {
            config,
            visualizer: Visualizer::new(),
        }
    }

    pub fn with_visualizer(mut self, visualizer: Visualizer) -> Self {
        self.visualizer = visualizer;
        self
    }

    pub fn compute_fingerprint<P: AsRef<Path>>(&self, path: P) -> Result<SpectralFingerprint> {
        let gray = load_grayscale(path)?;
        self.fingerprint_gray(&gray)
    }

    pub fn fingerprint_bytes(&self, bytes: &[u8]) -> Result<SpectralFingerprint> {
        let gray = decode_grayscale(bytes)?;
        self.fingerprint_gray(&gray)
    }

    pub fn fingerprint_image(&self, image: &DynamicImage) -> Result<SpectralFingerprint> {
        self.fingerprint_gray(&to_grayscale(image))
    }

    pub fn fingerprint_gray(&self, gray: &GrayImage) -> Result<SpectralFingerprint> {
        let spectrum = MagnitudeSpectrum::from_gray(gray)?;
        let log_magnitude = spectrum.log_scaled();
        let figure = self.visualizer.render_spectrum(&log_magnitude)?;

        Ok(SpectralFingerprint {
            spectrum,
            log_magnitude,
            figure,
        })
    }

    pub fn analyze_patterns<P: AsRef<Path>>(&self, path: P) -> Result<PatternVerdict> {
        let gray = load_grayscale(path)?;
        self.analyze_gray(&gray)
    }

    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<PatternVerdict> {
        let gray = decode_grayscale(bytes)?;
        self.analyze_gray(&gray)
    }

    pub fn analyze_image(&self, image: &DynamicImage) -> Result<PatternVerdict> {
        self.analyze_gray(&to_grayscale(image))
    }

    pub fn analyze_gray(&self, gray: &GrayImage) -> Result<PatternVerdict> {
        let spectrum = MagnitudeSpectrum::from_gray(gray)?;
        self.analyze_spectrum(&spectrum)
    }

    /// Two-line verdict for display, or [`UNANALYZABLE_MESSAGE`] if the
    /// image cannot be loaded or transformed.
    pub fn pattern_summary<P: AsRef<Path>>(&self, path: P) -> String {
        match self.analyze_patterns(path) {
            Ok(verdict) => verdict.message(),
            Err(e) => {
                debug!("spectral analysis failed: {}", e);
                UNANALYZABLE_MESSAGE.to_string()
            }
        }
    }

    pub fn analyze_spectrum(&self, spectrum: &MagnitudeSpectrum) -> Result<PatternVerdict> {
        if self.config.radius_divisor == 0 {
            return Err(DetectorError::InvalidParameter(
                "radius_divisor must be positive".into(),
            ));
        }

        let (height, width) = spectrum.dim();
        let mask = AnnulusMask::new(height, width, self.config.radius_divisor);
        let floor = spectrum.max() * self.config.noise_floor_ratio;

        let outer = mask
            .select(spectrum.values())
            .into_iter()
            .map(|v| if v < floor { 0.0 } else { v })
            .collect::<Vec<_>>();

        let statistics = self.outer_statistics(&outer, mask.radius());

        debug!(
            "spectrum {}x{}: radius={} mean={:.3} std={:.3} max={:.3} anomalies={}",
            width,
            height,
            statistics.exclusion_radius,
            statistics.mean,
            statistics.std_deviation,
            statistics.max,
            statistics.anomaly_count
        );

        Ok(PatternVerdict {
            anomalous: statistics.anomaly_count > self.config.anomaly_count_threshold,
            statistics,
        })
    }

    fn outer_statistics(&self, outer: &[f64], radius: usize) -> SpectralStatistics {
        if outer.is_empty() {
            return SpectralStatistics {
                mean: 0.0,
                std_deviation: 0.0,
                max: 0.0,
                threshold: 0.0,
                anomaly_count: 0,
                outer_cells: 0,
                exclusion_radius: radius,
            };
        }

        let mean = outer.mean();
        let std_deviation = outer.population_std_dev();
        let max = outer.max();
        let threshold = mean + self.config.sigma_multiplier * std_deviation;
        let anomaly_count = outer.iter().filter(|&&v| v > threshold).count();

        SpectralStatistics {
            mean,
            std_deviation,
            max,
            threshold,
            anomaly_count,
            outer_cells: outer.len(),
            exclusion_radius: radius,
        }
    }
}

impl Default for SpectralFingerprintAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
