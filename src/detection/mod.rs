pub mod engine;
pub mod huggingface;
pub mod labels;

use std::fmt;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Where an image most likely came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Artificial,
    Real,
    Unknown,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provenance::Artificial => "Artificial",
            Provenance::Real => "Real",
            Provenance::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// One class score as reported by a classifier backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub score: f64,
}

impl Prediction {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectionResult {
    pub provenance: Provenance,
    /// Percentage in `0..=100`.
    pub confidence: f64,
    pub model_used: Option<String>,
    pub predictions: Vec<Prediction>,
    /// Set when the label did not resolve through the mapping or keyword sets.
    pub ambiguous: bool,
}

impl DetectionResult {
    pub fn unavailable() -> Self {
        Self {
            provenance: Provenance::Unknown,
            confidence: 0.0,
            model_used: None,
            predictions: Vec::new(),
            ambiguous: false,
        }
    }

    pub fn is_available(&self) -> bool {
        self.model_used.is_some()
    }

    pub fn is_artificial(&self) -> bool {
        self.provenance == Provenance::Artificial
    }

    /// `"98.0% Artificial"`, or `"Model unavailable"` without a model.
    pub fn formatted(&self) -> String {
        if self.is_available() {
            format!("{:.1}% {}", self.confidence, self.provenance)
        } else {
            "Model unavailable".to_string()
        }
    }
}

/// A loaded image classification model.
pub trait Classifier: Send + Sync {
    /// Class scores, best first.
    fn classify(&self, image: &DynamicImage) -> Result<Vec<Prediction>>;

    fn model_id(&self) -> &str;
}

/// Produces classifiers for model identifiers.
pub trait ClassifierLoader: Send + Sync {
    fn load(&self, model_id: &str) -> Result<Box<dyn Classifier>>;

    fn name(&self) -> &str;
}
