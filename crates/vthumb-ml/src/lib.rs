//! Image/text similarity for thumbnail ranking.
//!
//! This crate provides:
//! - The [`SimilarityModel`] seam and stable prompt/ensemble ranking
//! - A CLIP implementation on ONNX Runtime ([`ClipModel`])
//! - CLIP tokenization and token-budget truncation ([`PromptTokenizer`])
//! - A lazily loaded shared model handle ([`LazyModel`])

pub mod clip;
pub mod config;
pub mod error;
pub mod preprocess;
pub mod ranker;
pub mod shared;
pub mod tokenizer;

pub use clip::ClipModel;
pub use config::ClipConfig;
pub use error::{MlError, MlResult};
pub use ranker::{rank_with_ensemble, rank_with_prompt, SimilarityModel};
pub use shared::{lazy_clip, LazyModel};
pub use tokenizer::{truncate_to_budget, ClipTokenizer, PromptTokenizer};
