//! Selection results.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::prompt::RefinedPrompt;
use crate::run::RunId;
use crate::size::TargetSize;

/// Which ranking path produced the final order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RankingMode {
    /// Ranked with the (refined) user selection string
    UserPrompt,
    /// Ensemble ranking re-ranked with the default description
    DefaultEnsemble,
}

impl RankingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankingMode::UserPrompt => "user_prompt",
            RankingMode::DefaultEnsemble => "default_ensemble",
        }
    }
}

/// Result of one thumbnail selection run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ThumbnailSelection {
    /// Run identifier, also attached to every log line of the run
    pub run_id: RunId,
    /// Every generated thumbnail, in frame extraction order
    pub all_thumbnail_paths: Vec<PathBuf>,
    /// Thumbnails in the order of the last ranking applied
    pub ranked_thumbnail_paths: Vec<PathBuf>,
    /// Head of `ranked_thumbnail_paths`
    pub best_thumbnail: PathBuf,
    /// Ranking path taken
    pub mode: RankingMode,
    /// Prompt used for the final single-prompt ranking
    pub prompt: RefinedPrompt,
    /// Resolution of every thumbnail
    pub size: TargetSize,
    pub generated_at: DateTime<Utc>,
}

impl ThumbnailSelection {
    /// Number of thumbnails generated.
    pub fn len(&self) -> usize {
        self.all_thumbnail_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_thumbnail_paths.is_empty()
    }
}
