use thiserror::Error;

/// Failure taxonomy of the prediction pipeline.
///
/// `Configuration` only happens at startup and is fatal. The others are
/// per-request: the caller rejects the request and carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Model is not initialized yet")]
    NotInitialized,
}

impl ClassifierError {
    /// Only a request that raced model loading can succeed when sent again
    /// unchanged; everything else is a deterministic function of its input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClassifierError::NotInitialized)
    }
}

impl From<image::ImageError> for ClassifierError {
    fn from(err: image::ImageError) -> Self {
        ClassifierError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClassifierError>;
