//! Thumbnail selection requests.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::prompt::SelectionMode;
use crate::size::TargetSize;

/// Output directory used when the caller does not name one.
pub const DEFAULT_OUTPUT_DIR: &str = "virality_thumbnails";
/// Frames sampled when the caller does not say otherwise.
pub const DEFAULT_NUM_FRAMES: u32 = 20;

/// Request to generate thumbnails for one video and pick the best one.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct ThumbnailRequest {
    /// Local path of the source video
    pub video_path: PathBuf,

    /// Directory the thumbnails are written to (created if missing)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Number of evenly spaced frames to sample
    #[serde(default = "default_num_frames")]
    #[validate(range(min = 1))]
    pub num_frames: u32,

    /// Output resolutions; the first entry is the one rendered and ranked
    #[serde(default = "default_target_sizes")]
    #[validate(length(min = 1), nested)]
    pub target_sizes: Vec<TargetSize>,

    /// Optional free-text selection intent
    #[serde(default)]
    pub selection_string: Option<String>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_num_frames() -> u32 {
    DEFAULT_NUM_FRAMES
}

fn default_target_sizes() -> Vec<TargetSize> {
    vec![TargetSize::default()]
}

impl ThumbnailRequest {
    /// Create a request with default output directory, frame count and size.
    pub fn new(video_path: impl Into<PathBuf>) -> Self {
        Self {
            video_path: video_path.into(),
            output_dir: default_output_dir(),
            num_frames: DEFAULT_NUM_FRAMES,
            target_sizes: default_target_sizes(),
            selection_string: None,
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_num_frames(mut self, num_frames: u32) -> Self {
        self.num_frames = num_frames;
        self
    }

    pub fn with_target_sizes(mut self, target_sizes: Vec<TargetSize>) -> Self {
        self.target_sizes = target_sizes;
        self
    }

    pub fn with_selection(mut self, selection: impl Into<String>) -> Self {
        self.selection_string = Some(selection.into());
        self
    }

    /// Resolution every thumbnail is rendered at.
    pub fn primary_size(&self) -> Option<TargetSize> {
        self.target_sizes.first().copied()
    }

    /// Ranking policy implied by the selection string.
    pub fn mode(&self) -> SelectionMode {
        SelectionMode::from_selection(self.selection_string.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Prompt;

    #[test]
    fn test_request_defaults() {
        let request: ThumbnailRequest =
            serde_json::from_str(r#"{"video_path": "clip.mp4"}"#).unwrap();
        assert_eq!(request.output_dir, PathBuf::from("virality_thumbnails"));
        assert_eq!(request.num_frames, 20);
        assert_eq!(request.primary_size(), Some(TargetSize::new(1080, 1920)));
        assert_eq!(request.mode(), SelectionMode::DefaultEnsemble);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_request_validation() {
        let zero_frames = ThumbnailRequest::new("clip.mp4").with_num_frames(0);
        assert!(zero_frames.validate().is_err());

        let no_sizes = ThumbnailRequest::new("clip.mp4").with_target_sizes(vec![]);
        assert!(no_sizes.validate().is_err());

        let zero_width =
            ThumbnailRequest::new("clip.mp4").with_target_sizes(vec![TargetSize::new(0, 10)]);
        assert!(zero_width.validate().is_err());
    }

    #[test]
    fn test_request_mode_with_selection() {
        let request = ThumbnailRequest::new("clip.mp4").with_selection("cat on a skateboard");
        assert_eq!(
            request.mode(),
            SelectionMode::UserPrompt(Prompt::from("cat on a skateboard"))
        );
    }
}
