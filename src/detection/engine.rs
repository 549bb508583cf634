use std::{collections::HashMap, sync::Arc};

use image::DynamicImage;
use log::{info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{
    detection::{Classifier, ClassifierLoader, DetectionResult, Provenance, labels::LabelMapping},
    error::{DetectorError, Result},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub preferred_model: String,
    /// Tried in order when the preferred model cannot be loaded.
    pub fallback_models: Vec<String>,
    /// Extra label tables keyed by model id; entries override the built-in ones.
    pub label_tables: HashMap<String, HashMap<String, Provenance>>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            preferred_model: "umm-maybe/AI-image-detector".into(),
            fallback_models: vec![
                "Organika/sdxl-detector".into(),
                "saltacc/anime-ai-detect".into(),
                "google/vit-base-patch16-224".into(),
            ],
            label_tables: HashMap::new(),
        }
    }
}

impl ModelConfig {
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.preferred_model.as_str())
            .chain(self.fallback_models.iter().map(String::as_str))
    }
}

pub struct LoadedModel {
    classifier: Box<dyn Classifier>,
    mapping: LabelMapping,
}

impl LoadedModel {
    pub fn model_id(&self) -> &str {
        self.classifier.model_id()
    }
}

pub enum ModelState {
    Uninitialized,
    Ready(Arc<LoadedModel>),
    Failed(String),
}

impl ModelState {
    pub fn describe(&self) -> String {
        match self {
            ModelState::Uninitialized => "uninitialized".to_string(),
            ModelState::Ready(model) => format!("ready ({})", model.model_id()),
            ModelState::Failed(reason) => format!("failed: {}", reason),
        }
    }
}

/// Owns the classifier for a session. Constructed once and shared by handle.
pub struct DetectionEngine {
    loader: Box<dyn ClassifierLoader>,
    config: ModelConfig,
    state: RwLock<ModelState>,
}

impl DetectionEngine {
    pub fn new(loader: Box<dyn ClassifierLoader>) -> Self {
        Self::with_config(loader, ModelConfig::default())
    }

    pub fn with_config(loader: Box<dyn ClassifierLoader>, config: ModelConfig) -> Self {
        Self {
            loader,
            config,
            state: RwLock::new(ModelState::Uninitialized),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.read(), ModelState::Ready(_))
    }

    pub fn state_description(&self) -> String {
        self.state.read().describe()
    }

    pub fn model_id(&self) -> Option<String> {
        match &*self.state.read() {
            ModelState::Ready(model) => Some(model.model_id().to_string()),
            _ => None,
        }
    }

    /// Loads the preferred model, falling back through the configured list.
    /// Can be called again after a failure.
    pub fn initialize(&self) -> Result<String> {
        for model_id in self.config.candidates() {
            info!("Loading model {} via {}", model_id, self.loader.name());

            match self.loader.load(model_id) {
                Ok(classifier) => {
                    let mapping = self.mapping_for(model_id);
                    let loaded = Arc::new(LoadedModel { classifier, mapping });
                    *self.state.write() = ModelState::Ready(loaded);
                    info!("Model {} loaded", model_id);
                    return Ok(model_id.to_string());
                }
                Err(e) => warn!("Model {} failed to load: {}", model_id, e),
            }
        }

        let reason = "Failed to load any detection model".to_string();
        *self.state.write() = ModelState::Failed(reason.clone());
        Err(DetectorError::ModelUnavailable(reason))
    }

    fn mapping_for(&self, model_id: &str) -> LabelMapping {
        let builtin = LabelMapping::for_model(model_id);
        match self.config.label_tables.get(model_id) {
            Some(table) => table
                .iter()
                .fold(builtin, |mapping, (label, &p)| mapping.with_label(label, p)),
            None => builtin,
        }
    }

    fn loaded(&self) -> Result<Arc<LoadedModel>> {
        match &*self.state.read() {
            ModelState::Ready(model) => Ok(Arc::clone(model)),
            ModelState::Uninitialized => Err(DetectorError::ModelUnavailable(
                "Model not loaded".into(),
            )),
            ModelState::Failed(reason) => Err(DetectorError::ModelUnavailable(reason.clone())),
        }
    }

    pub fn detect(&self, image: &DynamicImage) -> Result<DetectionResult> {
        let model = self.loaded()?;
        let predictions = model.classifier.classify(&image.to_rgb8().into())?;
        let resolution = model.mapping.resolve(&predictions)?;
        let score = predictions[resolution.prediction_index].score;

        if resolution.ambiguous {
            warn!(
                "Label '{}' from {} is ambiguous, resolved as {}",
                predictions[0].label,
                model.model_id(),
                resolution.provenance
            );
        }

        Ok(DetectionResult {
            provenance: resolution.provenance,
            confidence: score * 100.0,
            model_used: Some(model.model_id().to_string()),
            predictions,
            ambiguous: resolution.ambiguous,
        })
    }

    /// Like [`detect`](Self::detect), but a missing model yields the
    /// zero-confidence unavailable result instead of an error.
    pub fn detect_or_unavailable(&self, image: &DynamicImage) -> Result<DetectionResult> {
        match self.detect(image) {
            Err(DetectorError::ModelUnavailable(_)) => Ok(DetectionResult::unavailable()),
            other => other,
        }
    }

    pub fn formatted_result(&self, image: &DynamicImage) -> Result<String> {
        Ok(self.detect(image)?.formatted())
    }
}
