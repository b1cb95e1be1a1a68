//! Structured run logging utilities.
//!
//! Every selection run logs its lifecycle with the run id and source video
//! attached, so interleaved runs can be told apart.

use std::path::Path;

use tracing::{error, info, warn, Span};
use vthumb_models::RunId;

/// Run logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    video: String,
}

impl RunLogger {
    /// Create a new logger for a run over `video`.
    pub fn new(run_id: &RunId, video: &Path) -> Self {
        Self {
            run_id: run_id.to_string(),
            video: video.display().to_string(),
        }
    }

    /// Log the start of a run.
    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            video = %self.video,
            "Run started: {}", message
        );
    }

    /// Log a pipeline stage transition.
    pub fn log_stage(&self, stage: &str, message: &str) {
        info!(
            run_id = %self.run_id,
            stage,
            "Run progress: {}", message
        );
    }

    /// Log a warning during the run.
    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            video = %self.video,
            "Run warning: {}", message
        );
    }

    /// Log a failed run.
    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            video = %self.video,
            "Run failed: {}", message
        );
    }

    /// Log the completion of a run.
    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            video = %self.video,
            "Run completed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn video(&self) -> &str {
        &self.video
    }

    /// Create a tracing span for this run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "thumbnail_run",
            run_id = %self.run_id,
            video = %self.video
        )
    }
}
