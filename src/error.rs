use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Image loading error: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Detection model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Classification failed: {0}")]
    Classification(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rendering failed: {0}")]
    Render(String),
}

impl From<serde_json::Error> for DetectorError {
    fn from(err: serde_json::Error) -> Self {
        DetectorError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DetectorError>;
