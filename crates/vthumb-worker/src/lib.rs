//! Thumbnail selection pipeline.
//!
//! This crate provides:
//! - The [`ThumbnailSelector`] orchestrator (sample, render, rank)
//! - Prompt refinement through Gemini with retry and fallback
//! - Environment-driven configuration
//! - Structured run logging and metrics

pub mod config;
pub mod error;
pub mod gemini;
pub mod logging;
pub mod metrics;
pub mod refiner;
pub mod retry;
pub mod selector;

pub use config::{GeminiConfig, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use gemini::GeminiClient;
pub use logging::RunLogger;
pub use refiner::{PromptRefiner, RefineError, TextGenerator};
pub use retry::{retry_async, RetryConfig, RetryResult};
pub use selector::ThumbnailSelector;
