//! Selection pipeline metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! binary installs a recorder.

use ::metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::{WorkerError, WorkerResult};

/// Metric name constants for consistency.
pub mod names {
    /// Selection runs by ranking mode.
    pub const RUNS_TOTAL: &str = "vthumb_runs_total";

    /// Selection runs that ended in an error, by error kind.
    pub const RUNS_FAILED_TOTAL: &str = "vthumb_runs_failed_total";

    /// Frames decoded from source videos.
    pub const FRAMES_SAMPLED_TOTAL: &str = "vthumb_frames_sampled_total";

    /// Thumbnails written to disk.
    pub const THUMBNAILS_RENDERED_TOTAL: &str = "vthumb_thumbnails_rendered_total";

    /// Refinements that fell back to the original prompt, by reason.
    pub const REFINE_FALLBACKS_TOTAL: &str = "vthumb_refine_fallbacks_total";

    /// Wall time of a whole selection run.
    pub const SELECTION_DURATION_SECONDS: &str = "vthumb_selection_duration_seconds";
}

/// Install the Prometheus recorder.
pub fn init_metrics() -> WorkerResult<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| WorkerError::config_error(format!("Prometheus recorder: {e}")))
}

/// Record a completed selection run.
pub fn record_run(mode: &'static str, duration_secs: f64) {
    counter!(names::RUNS_TOTAL, "mode" => mode).increment(1);
    histogram!(names::SELECTION_DURATION_SECONDS, "mode" => mode).record(duration_secs);
}

/// Record a failed selection run.
pub fn record_run_failed(kind: &'static str) {
    counter!(names::RUNS_FAILED_TOTAL, "kind" => kind).increment(1);
}

pub fn record_frames_sampled(count: usize) {
    counter!(names::FRAMES_SAMPLED_TOTAL).increment(count as u64);
}

pub fn record_thumbnails_rendered(count: usize) {
    counter!(names::THUMBNAILS_RENDERED_TOTAL).increment(count as u64);
}

/// Record a refinement that fell back to the unrefined prompt.
pub fn record_refine_fallback(reason: &'static str) {
    counter!(names::REFINE_FALLBACKS_TOTAL, "reason" => reason).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::RUNS_TOTAL.starts_with("vthumb_"));
        assert!(names::REFINE_FALLBACKS_TOTAL.contains("fallbacks"));
        assert!(names::SELECTION_DURATION_SECONDS.ends_with("_seconds"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_run("user_prompt", 1.5);
        record_run_failed("media");
        record_frames_sampled(5);
        record_thumbnails_rendered(5);
        record_refine_fallback("timeout");
    }
}
