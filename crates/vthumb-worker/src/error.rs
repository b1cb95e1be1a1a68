//! Worker error types.

use thiserror::Error;
use vthumb_media::MediaError;
use vthumb_ml::MlError;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Failures that abort a selection run.
///
/// Prompt refinement failures never show up here; they degrade to the
/// unrefined prompt inside the refiner.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Ranking error: {0}")]
    Ranking(#[from] MlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::Config(_) => "config",
            WorkerError::Media(_) => "media",
            WorkerError::Ranking(_) => "ranking",
            WorkerError::Io(_) => "io",
            WorkerError::TaskJoin(_) => "task_join",
        }
    }
}

impl From<validator::ValidationErrors> for WorkerError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Config(format!("invalid request: {errors}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(WorkerError::config_error("x").kind(), "config");
        assert_eq!(
            WorkerError::from(MediaError::FfmpegNotFound).kind(),
            "media"
        );
        assert_eq!(
            WorkerError::from(MlError::inference("boom")).kind(),
            "ranking"
        );
    }
}
