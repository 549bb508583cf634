//! Mapping from classifier label vocabularies to [`Provenance`].

use std::collections::HashMap;

use crate::{
    detection::{Prediction, Provenance},
    error::{DetectorError, Result},
};

pub const AI_KEYWORDS: [&str; 8] = [
    "artificial",
    "fake",
    "ai",
    "generated",
    "synthetic",
    "diffusion",
    "gan",
    "stable",
];

pub const REAL_KEYWORDS: [&str; 5] = ["real", "natural", "photo", "authentic", "human"];

pub const NEGATION_MARKER: &str = "not";

/// Outcome of resolving a prediction list.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelResolution {
    pub provenance: Provenance,
    /// Index of the prediction whose score backs the verdict.
    pub prediction_index: usize,
    pub ambiguous: bool,
}

/// Explicit label table for one backend, with keyword matching as the
/// fallback for labels outside the table.
#[derive(Debug, Clone, Default)]
pub struct LabelMapping {
    entries: HashMap<String, Provenance>,
}

impl LabelMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label: &str, provenance: Provenance) -> Self {
        self.entries.insert(label.to_lowercase(), provenance);
        self
    }

    /// Built-in vocabularies of the models the engine knows how to load.
    pub fn for_model(model_id: &str) -> Self {
        match model_id {
            "umm-maybe/AI-image-detector" | "Organika/sdxl-detector" => Self::new()
                .with_label("artificial", Provenance::Artificial)
                .with_label("human", Provenance::Real),
            "saltacc/anime-ai-detect" => Self::new()
                .with_label("ai", Provenance::Artificial)
                .with_label("human", Provenance::Real),
            _ => Self::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, label: &str) -> Provenance {
        let label = label.to_lowercase();

        if let Some(&provenance) = self.entries.get(&label) {
            return provenance;
        }

        if AI_KEYWORDS.iter().any(|k| label.contains(k)) {
            Provenance::Artificial
        } else if REAL_KEYWORDS.iter().any(|k| label.contains(k)) {
            Provenance::Real
        } else {
            Provenance::Unknown
        }
    }

    pub fn resolve(&self, predictions: &[Prediction]) -> Result<LabelResolution> {
        let top = predictions.first().ok_or_else(|| {
            DetectorError::Classification("Classifier returned no predictions".into())
        })?;

        match self.lookup(&top.label) {
            Provenance::Unknown => {}
            provenance => {
                return Ok(LabelResolution {
                    provenance,
                    prediction_index: 0,
                    ambiguous: false,
                });
            }
        }

        if let Some(index) = predictions
            .iter()
            .position(|p| self.lookup(&p.label) == Provenance::Artificial)
        {
            return Ok(LabelResolution {
                provenance: Provenance::Artificial,
                prediction_index: index,
                ambiguous: true,
            });
        }

        let provenance = if top.label.to_lowercase().contains(NEGATION_MARKER) {
            Provenance::Artificial
        } else {
            Provenance::Real
        };

        Ok(LabelResolution {
            provenance,
            prediction_index: 0,
            ambiguous: true,
        })
    }
}
