//! Classifier backend for the Hugging Face hosted inference API.
//!
//! Uses blocking HTTP; call from a plain thread or `spawn_blocking`.

use std::{env, time::Duration};

use image::DynamicImage;
use log::debug;
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::{
    detection::{Classifier, ClassifierLoader, Prediction},
    error::{DetectorError, Result},
    image_utils::encode_png,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HuggingFaceConfig {
    pub inference_base: String,
    pub hub_base: String,
    /// Environment variable holding the API token, if any.
    pub token_env: String,
    pub timeout_secs: u64,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            inference_base: "https://api-inference.huggingface.co".into(),
            hub_base: "https://huggingface.co".into(),
            token_env: "HF_TOKEN".into(),
            timeout_secs: 60,
        }
    }
}

impl HuggingFaceConfig {
    fn token(&self) -> Option<String> {
        env::var(&self.token_env).ok().filter(|t| !t.is_empty())
    }

    fn client(&self) -> Result<Client> {
        Ok(Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Predictions(Vec<Prediction>),
    Error { error: String },
}

pub struct HuggingFaceLoader {
    config: HuggingFaceConfig,
}

impl HuggingFaceLoader {
    pub fn new() -> Self {
        Self::with_config(HuggingFaceConfig::default())
    }

    pub fn with_config(config: HuggingFaceConfig) -> Self {
        Self { config }
    }
}

impl Default for HuggingFaceLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierLoader for HuggingFaceLoader {
    fn load(&self, model_id: &str) -> Result<Box<dyn Classifier>> {
        let url = format!("{}/api/models/{}", self.config.hub_base, model_id);
        debug!("Checking model {} at {}", model_id, url);

        let client = self.config.client()?;
        let response = self.config.authorize(client.get(&url)).send()?;

        if !response.status().is_success() {
            return Err(DetectorError::ModelUnavailable(format!(
                "{} returned {}",
                model_id,
                response.status()
            )));
        }

        Ok(Box::new(HuggingFaceClassifier {
            model_id: model_id.to_string(),
            config: self.config.clone(),
        }))
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}

pub struct HuggingFaceClassifier {
    model_id: String,
    config: HuggingFaceConfig,
}

impl Classifier for HuggingFaceClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Vec<Prediction>> {
        let url = format!("{}/models/{}", self.config.inference_base, self.model_id);
        let body = encode_png(&image.to_rgb8())?;

        let client = self.config.client()?;
        let response = self
            .config
            .authorize(client.post(&url))
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(body)
            .send()?;

        let status = response.status();
        let text = response.text()?;

        match serde_json::from_str::<InferenceResponse>(&text) {
            Ok(InferenceResponse::Predictions(mut predictions)) => {
                predictions.sort_by(|a, b| b.score.total_cmp(&a.score));
                Ok(predictions)
            }
            Ok(InferenceResponse::Error { error }) => Err(DetectorError::Classification(error)),
            Err(e) => Err(DetectorError::Classification(format!(
                "Unexpected response ({}): {}",
                status, e
            ))),
        }
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
