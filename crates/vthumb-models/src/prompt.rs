//! Selection prompts and refinement outcomes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Maximum number of text tokens the CLIP text encoder accepts.
pub const PROMPT_TOKEN_BUDGET: usize = 77;

/// Generic descriptions averaged when the caller gives no selection intent.
pub const DEFAULT_ENSEMBLE_PROMPTS: [&str; 3] = [
    "A vibrant and eye-catching thumbnail with bold colors and dynamic composition.",
    "A highly engaging thumbnail that looks modern and trendy for social media reels and shorts.",
    "A viral thumbnail with dramatic contrasts, clear focal points, and exciting typography.",
];

/// Richer description used to re-rank the ensemble ordering.
pub const DEFAULT_DESCRIPTION: &str = "An ultra-dynamic, high-energy thumbnail designed for viral impact: \
featuring vivid, bold colors, dramatic contrasts, and striking typography. The image should evoke \
excitement and curiosity with a balanced, eye-catching composition and clear focal points, \
optimized for social media reels and shorts";

/// Raw selection intent, as supplied by the user or a built-in default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Prompt(String);

impl Prompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Prompt {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Outcome of prompt refinement.
///
/// Refinement never fails from the caller's point of view: when the
/// text-generation service is unavailable the original text comes back
/// as [`RefinedPrompt::Unrefined`] together with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RefinedPrompt {
    /// Rewritten (and token-truncated) text.
    Refined { text: String },
    /// Original text, passed through untouched.
    Unrefined { text: String, reason: String },
}

impl RefinedPrompt {
    pub fn refined(text: impl Into<String>) -> Self {
        Self::Refined { text: text.into() }
    }

    pub fn unrefined(original: &Prompt, reason: impl Into<String>) -> Self {
        Self::Unrefined {
            text: original.as_str().to_string(),
            reason: reason.into(),
        }
    }

    /// Text to rank with, whichever variant this is.
    pub fn text(&self) -> &str {
        match self {
            Self::Refined { text } | Self::Unrefined { text, .. } => text,
        }
    }

    pub fn is_refined(&self) -> bool {
        matches!(self, Self::Refined { .. })
    }
}

/// Ranking policy for one run, decided once from the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionMode {
    /// Refine the user's intent and rank with it alone.
    UserPrompt(Prompt),
    /// Ensemble ranking followed by a re-rank with [`DEFAULT_DESCRIPTION`].
    DefaultEnsemble,
}

impl SelectionMode {
    /// Blank or whitespace-only selection strings select the default ensemble.
    pub fn from_selection(selection: Option<&str>) -> Self {
        match selection.map(str::trim) {
            Some(text) if !text.is_empty() => Self::UserPrompt(Prompt::new(text)),
            _ => Self::DefaultEnsemble,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_selection() {
        assert_eq!(
            SelectionMode::from_selection(Some("  neon city at night ")),
            SelectionMode::UserPrompt(Prompt::from("neon city at night"))
        );
        assert_eq!(
            SelectionMode::from_selection(Some("   ")),
            SelectionMode::DefaultEnsemble
        );
        assert_eq!(SelectionMode::from_selection(None), SelectionMode::DefaultEnsemble);
    }

    #[test]
    fn test_unrefined_keeps_original_text() {
        let original = Prompt::from("A vibrant thumbnail");
        let outcome = RefinedPrompt::unrefined(&original, "timeout");
        assert_eq!(outcome.text(), "A vibrant thumbnail");
        assert!(!outcome.is_refined());
    }

    #[test]
    fn test_refined_prompt_serialization() {
        let outcome = RefinedPrompt::refined("bold colors");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "refined");
        assert_eq!(json["text"], "bold colors");
    }
}
