//! Worker configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;
use vthumb_ml::ClipConfig;
use vthumb_models::{ThumbnailRequest, TargetSize, DEFAULT_NUM_FRAMES, DEFAULT_OUTPUT_DIR};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Gemini text-generation settings.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key; without one every refinement falls back
    pub api_key: Option<String>,
    /// Scheme and host of the REST API
    pub base_url: String,
    /// Models tried in order until one answers
    pub models: Vec<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            models: vec![DEFAULT_GEMINI_MODEL.to_string()],
            timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("models", &self.models)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl GeminiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let models: Vec<String> = std::env::var("GEMINI_MODELS")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            models: if models.is_empty() {
                vec![DEFAULT_GEMINI_MODEL.to_string()]
            } else {
                models
            },
            timeout: Duration::from_secs(
                std::env::var("GEMINI_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_retries: std::env::var("GEMINI_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Directory thumbnails are written to
    pub output_dir: PathBuf,
    /// Frames sampled per video
    pub num_frames: u32,
    /// Requested sizes; the first one is rendered
    pub target_sizes: Vec<TargetSize>,
    /// Bound on each FFmpeg/ffprobe call
    pub ffmpeg_timeout_secs: u64,
    pub gemini: GeminiConfig,
    pub clip: ClipConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            num_frames: DEFAULT_NUM_FRAMES,
            target_sizes: vec![TargetSize::default()],
            ffmpeg_timeout_secs: 60,
            gemini: GeminiConfig::default(),
            clip: ClipConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let target_sizes = match std::env::var("THUMB_TARGET_SIZES") {
            Ok(raw) => TargetSize::parse_list(&raw).unwrap_or_else(|e| {
                warn!(value = %raw, error = %e, "Ignoring invalid THUMB_TARGET_SIZES");
                vec![TargetSize::default()]
            }),
            Err(_) => vec![TargetSize::default()],
        };

        Self {
            output_dir: std::env::var("THUMB_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            num_frames: std::env::var("THUMB_NUM_FRAMES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_NUM_FRAMES),
            target_sizes,
            ffmpeg_timeout_secs: std::env::var("THUMB_FFMPEG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            gemini: GeminiConfig::from_env(),
            clip: ClipConfig::from_env(),
        }
    }

    /// Build a request for `video_path` from these defaults.
    pub fn request_for(
        &self,
        video_path: impl AsRef<Path>,
        selection: Option<String>,
    ) -> ThumbnailRequest {
        let request = ThumbnailRequest::new(video_path.as_ref())
            .with_output_dir(self.output_dir.clone())
            .with_num_frames(self.num_frames)
            .with_target_sizes(self.target_sizes.clone());

        match selection {
            Some(selection) => request.with_selection(selection),
            None => request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("virality_thumbnails"));
        assert_eq!(config.num_frames, 20);
        assert_eq!(config.target_sizes, vec![TargetSize::new(1080, 1920)]);
        assert_eq!(config.gemini.models, vec!["gemini-2.0-flash".to_string()]);
        assert_eq!(config.gemini.timeout, Duration::from_secs(30));
        assert_eq!(config.gemini.max_retries, 2);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = GeminiConfig {
            api_key: Some("super-secret".to_string()),
            ..GeminiConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_request_for_copies_defaults() {
        let config = WorkerConfig {
            num_frames: 5,
            target_sizes: vec![TargetSize::new(720, 1280)],
            ..WorkerConfig::default()
        };
        let request = config.request_for("clip.mp4", Some("sunset".to_string()));

        assert_eq!(request.num_frames, 5);
        assert_eq!(request.primary_size(), Some(TargetSize::new(720, 1280)));
        assert_eq!(request.selection_string.as_deref(), Some("sunset"));
    }
}
