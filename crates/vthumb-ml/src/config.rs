//! CLIP model configuration.

use std::path::PathBuf;

/// Default ONNX export of `openai/clip-vit-base-patch32`.
pub const DEFAULT_MODEL_PATH: &str = "models/clip/clip-vit-base-patch32.onnx";
/// Default HuggingFace tokenizer definition for the same checkpoint.
pub const DEFAULT_TOKENIZER_PATH: &str = "models/clip/tokenizer.json";

/// Where to find the CLIP model and how to run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipConfig {
    /// Path to the ONNX model file
    pub model_path: PathBuf,
    /// Path to `tokenizer.json`
    pub tokenizer_path: PathBuf,
    /// ORT intra-op threads (None = ORT default)
    pub intra_threads: Option<usize>,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            tokenizer_path: PathBuf::from(DEFAULT_TOKENIZER_PATH),
            intra_threads: None,
        }
    }
}

impl ClipConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            model_path: std::env::var("CLIP_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_PATH)),
            tokenizer_path: std::env::var("CLIP_TOKENIZER_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOKENIZER_PATH)),
            intra_threads: std::env::var("CLIP_INTRA_THREADS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n: &usize| n > 0),
        }
    }
}
