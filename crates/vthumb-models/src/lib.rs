//! Shared data models for ViralThumb.
//!
//! This crate provides Serde-serializable types for:
//! - Thumbnail selection requests and target sizes
//! - Selection prompts, modes and refinement outcomes
//! - Selection results handed back to callers

pub mod prompt;
pub mod request;
pub mod run;
pub mod selection;
pub mod size;

// Re-export common types
pub use prompt::{
    Prompt, RefinedPrompt, SelectionMode, DEFAULT_DESCRIPTION, DEFAULT_ENSEMBLE_PROMPTS,
    PROMPT_TOKEN_BUDGET,
};
pub use request::{ThumbnailRequest, DEFAULT_NUM_FRAMES, DEFAULT_OUTPUT_DIR};
pub use run::RunId;
pub use selection::{RankingMode, ThumbnailSelection};
pub use size::{TargetSize, TargetSizeError};
