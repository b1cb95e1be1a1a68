//! Prompt refinement with graceful fallback.
//!
//! The user's selection intent is rewritten by a text-generation service
//! into a short visual description that fits the CLIP token budget. Any
//! failure along the way hands back the original prompt instead, marked
//! as [`RefinedPrompt::Unrefined`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};
use vthumb_ml::{truncate_to_budget, PromptTokenizer};
use vthumb_models::{Prompt, RefinedPrompt, PROMPT_TOKEN_BUDGET};

use crate::metrics;
use crate::retry::{retry_async, RetryConfig};

/// Reasons a refinement attempt can fail. Never escapes [`PromptRefiner`].
#[derive(Debug, Error)]
pub enum RefineError {
    #[error("GEMINI_API_KEY not set")]
    MissingApiKey,

    /// Carries no URL, so nothing request-specific leaks into logs or results.
    #[error("request failed: {0}")]
    Request(reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("service returned no text")]
    EmptyResponse,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("truncation failed: {0}")]
    Truncation(String),
}

impl From<reqwest::Error> for RefineError {
    fn from(e: reqwest::Error) -> Self {
        RefineError::Request(e.without_url())
    }
}

impl RefineError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RefineError::Request(_) | RefineError::Timeout(_) => true,
            RefineError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RefineError::MissingApiKey => "missing_api_key",
            RefineError::Request(_) => "request",
            RefineError::Status { .. } => "status",
            RefineError::EmptyResponse => "empty_response",
            RefineError::Malformed(_) => "malformed",
            RefineError::Timeout(_) => "timeout",
            RefineError::Truncation(_) => "truncation",
        }
    }
}

/// Free-text generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, RefineError>;
}

/// Instruction sent to the generator for `prompt`.
pub fn refinement_instruction(prompt: &str) -> String {
    format!(
        "Refine the following prompt: '{prompt}' make sure the final output is at max {PROMPT_TOKEN_BUDGET} tokens. \
Only provide a summarized {PROMPT_TOKEN_BUDGET}-token reply."
    )
}

/// Turns raw selection intent into a ranking prompt.
pub struct PromptRefiner {
    generator: Arc<dyn TextGenerator>,
    tokenizer: Arc<dyn PromptTokenizer>,
    retry: RetryConfig,
    timeout: Duration,
}

impl PromptRefiner {
    pub fn new(generator: Arc<dyn TextGenerator>, tokenizer: Arc<dyn PromptTokenizer>) -> Self {
        Self {
            generator,
            tokenizer,
            retry: RetryConfig::new("prompt_refinement"),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Bound on the whole refinement, retries and backoff included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Refine `prompt`, falling back to it unchanged on any failure.
    pub async fn refine(&self, prompt: &Prompt) -> RefinedPrompt {
        match self.try_refine(prompt).await {
            Ok(text) => {
                info!(original = %prompt.as_str(), refined = %text, "Prompt refined");
                RefinedPrompt::refined(text)
            }
            Err(e) => {
                warn!(error = %e, "Prompt refinement failed, using original prompt");
                metrics::record_refine_fallback(e.kind());
                RefinedPrompt::unrefined(prompt, e.to_string())
            }
        }
    }

    async fn try_refine(&self, prompt: &Prompt) -> Result<String, RefineError> {
        let instruction = refinement_instruction(prompt.as_str());

        let attempts = retry_async(
            &self.retry,
            || self.generator.generate(&instruction),
            RefineError::is_transient,
        );
        let text = tokio::time::timeout(self.timeout, attempts)
            .await
            .map_err(|_| RefineError::Timeout(self.timeout))?
            .into_result()?;

        let text = text.trim();
        if text.is_empty() {
            return Err(RefineError::EmptyResponse);
        }

        truncate_to_budget(self.tokenizer.as_ref(), text, PROMPT_TOKEN_BUDGET)
            .map_err(|e| RefineError::Truncation(e.to_string()))
    }
}
