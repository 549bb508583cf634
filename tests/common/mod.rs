#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use image::DynamicImage;
use parking_lot::Mutex;
use spectral_detect::{
    detection::{Classifier, ClassifierLoader, Prediction},
    error::{DetectorError, Result},
};

struct FixedClassifier {
    model_id: String,
    predictions: Vec<Prediction>,
}

impl Classifier for FixedClassifier {
    fn classify(&self, _image: &DynamicImage) -> Result<Vec<Prediction>> {
        Ok(self.predictions.clone())
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

pub type ModelRegistry = Arc<Mutex<HashMap<String, Vec<Prediction>>>>;

pub fn predictions(scores: &[(&str, f64)]) -> Vec<Prediction> {
    scores
        .iter()
        .map(|(label, score)| Prediction::new(*label, *score))
        .collect()
}

/// Serves canned predictions for the models in its registry and records
/// every load attempt. The registry can be changed after the loader is
/// handed to an engine.
#[derive(Default)]
pub struct StubLoader {
    pub models: ModelRegistry,
    pub attempts: Arc<Mutex<Vec<String>>>,
}

impl StubLoader {
    pub fn with_model(self, model_id: &str, scores: &[(&str, f64)]) -> Self {
        self.models
            .lock()
            .insert(model_id.to_string(), predictions(scores));
        self
    }
}

impl ClassifierLoader for StubLoader {
    fn load(&self, model_id: &str) -> Result<Box<dyn Classifier>> {
        self.attempts.lock().push(model_id.to_string());
        match self.models.lock().get(model_id) {
            Some(predictions) => Ok(Box::new(FixedClassifier {
                model_id: model_id.to_string(),
                predictions: predictions.clone(),
            })),
            None => Err(DetectorError::ModelUnavailable(format!(
                "{} not found",
                model_id
            ))),
        }
    }

    fn name(&self) -> &str {
        "stub"
    }
}
