//! Error types for similarity scoring and ranking.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for ML operations.
pub type MlResult<T> = Result<T, MlError>;

/// Errors raised while loading the model or scoring thumbnails.
#[derive(Debug, Error)]
pub enum MlError {
    #[error("Model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("ONNX session error: {0}")]
    Session(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Failed to load image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Non-finite score {score} for {path}")]
    NonFiniteScore { path: PathBuf, score: f32 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MlError {
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session(message.into())
    }

    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    pub fn tokenizer(message: impl Into<String>) -> Self {
        Self::Tokenizer(message.into())
    }
}
