//! Aggregate configuration, loadable from a JSON file.
//!
//! Every section and field is optional; missing values take the defaults of
//! the component they configure.
//!
//! ```json
//! {
//!   "spectral": { "sigma_multiplier": 3.0, "anomaly_count_threshold": 100 },
//!   "models": { "preferred_model": "umm-maybe/AI-image-detector" },
//!   "server": { "port": 5000 }
//! }
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    analysis::fingerprint::SpectralConfig,
    detection::{engine::ModelConfig, huggingface::HuggingFaceConfig},
    error::{DetectorError, Result},
    report::visualization::VisualizationConfig,
    web::ServerConfig,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub spectral: SpectralConfig,
    pub visualization: VisualizationConfig,
    pub models: ModelConfig,
    pub huggingface: HuggingFaceConfig,
    pub server: ServerConfig,
}

impl DetectorConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(&path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.spectral.radius_divisor == 0 {
            return Err(DetectorError::Config(
                "spectral.radius_divisor must be positive".into(),
            ));
        }
        if !self.spectral.sigma_multiplier.is_finite() || self.spectral.sigma_multiplier < 0.0 {
            return Err(DetectorError::Config(
                "spectral.sigma_multiplier must be a non-negative number".into(),
            ));
        }
        if self.server.max_concurrent_analyses == 0 {
            return Err(DetectorError::Config(
                "server.max_concurrent_analyses must be positive".into(),
            ));
        }
        if self.models.preferred_model.is_empty() {
            return Err(DetectorError::Config(
                "models.preferred_model must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = DetectorConfig::from_json(
            r#"{ "spectral": { "anomaly_count_threshold": 250 }, "server": { "port": 8080 } }"#,
        )
        .unwrap();
        assert_eq!(config.spectral.anomaly_count_threshold, 250);
        assert_eq!(config.spectral.sigma_multiplier, 3.0);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(config.models.fallback_models.len(), 3);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(DetectorConfig::from_json(r#"{ "spectral": { "radius_divisor": 0 } }"#).is_err());
        assert!(DetectorConfig::from_json(r#"{ "server": { "max_concurrent_analyses": 0 } }"#).is_err());
        assert!(DetectorConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_label_tables_parse() {
        let config = DetectorConfig::from_json(
            r#"{ "models": { "label_tables": { "my/model": { "LABEL_1": "artificial" } } } }"#,
        )
        .unwrap();
        assert!(config.models.label_tables.contains_key("my/model"));
    }
}
