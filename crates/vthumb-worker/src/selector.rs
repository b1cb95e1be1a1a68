//! Thumbnail selection pipeline.
//!
//! One run walks a fixed sequence of stages:
//!
//! ```text
//! validate -> sample frames -> render thumbnails -> rank -> done
//!                                                    |
//!                         user prompt: refine, rank with the refined prompt
//!                         no prompt:   ensemble rank, re-rank with description
//! ```
//!
//! Sampling, rendering and ranking failures abort the run. Refinement
//! failures degrade to the unrefined prompt and the run continues.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, Instrument};
use validator::Validate;
use vthumb_media::{ensure_dir, sample_frames, FrameDecoder, ThumbnailRenderer};
use vthumb_ml::{rank_with_ensemble, rank_with_prompt, MlError, SimilarityModel};
use vthumb_models::{
    RankingMode, RefinedPrompt, RunId, SelectionMode, TargetSize, ThumbnailRequest,
    ThumbnailSelection, DEFAULT_DESCRIPTION, DEFAULT_ENSEMBLE_PROMPTS,
};

use crate::error::{WorkerError, WorkerResult};
use crate::logging::RunLogger;
use crate::metrics;
use crate::refiner::PromptRefiner;

/// Reason recorded when the built-in description drives the final ranking.
const DEFAULT_DESCRIPTION_REASON: &str = "built-in description, not refined";

/// Samples, renders and ranks thumbnails for one video at a time.
pub struct ThumbnailSelector {
    decoder: Arc<dyn FrameDecoder>,
    renderer: ThumbnailRenderer,
    refiner: PromptRefiner,
    model: Arc<dyn SimilarityModel>,
    ensemble_prompts: Vec<String>,
    default_description: String,
}

impl ThumbnailSelector {
    pub fn new(
        decoder: Arc<dyn FrameDecoder>,
        refiner: PromptRefiner,
        model: Arc<dyn SimilarityModel>,
    ) -> Self {
        Self {
            decoder,
            renderer: ThumbnailRenderer::default(),
            refiner,
            model,
            ensemble_prompts: DEFAULT_ENSEMBLE_PROMPTS.iter().map(|p| p.to_string()).collect(),
            default_description: DEFAULT_DESCRIPTION.to_string(),
        }
    }

    /// Replace the generic prompts averaged when no selection is given.
    pub fn with_ensemble_prompts(mut self, prompts: Vec<String>) -> Self {
        self.ensemble_prompts = prompts;
        self
    }

    /// Replace the description used to re-rank the ensemble order.
    pub fn with_default_description(mut self, description: impl Into<String>) -> Self {
        self.default_description = description.into();
        self
    }

    /// Generate thumbnails for `request` and pick the best one.
    pub async fn select(&self, request: &ThumbnailRequest) -> WorkerResult<ThumbnailSelection> {
        let run_id = RunId::new();
        let logger = RunLogger::new(&run_id, &request.video_path);
        let span = logger.create_span();
        let started = Instant::now();

        let result = self
            .run(run_id, request, &logger)
            .instrument(span)
            .await;

        match &result {
            Ok(selection) => {
                metrics::record_run(selection.mode.as_str(), started.elapsed().as_secs_f64());
                logger.log_completion(&format!(
                    "best thumbnail {} of {}",
                    selection.best_thumbnail.display(),
                    selection.len()
                ));
            }
            Err(e) => {
                metrics::record_run_failed(e.kind());
                logger.log_error(&e.to_string());
            }
        }
        result
    }

    async fn run(
        &self,
        run_id: RunId,
        request: &ThumbnailRequest,
        logger: &RunLogger,
    ) -> WorkerResult<ThumbnailSelection> {
        let size = validate_request(request)?;
        let mode = request.mode();
        ensure_dir(&request.output_dir).await?;
        logger.log_start(&format!(
            "{} frames at {}, mode {}",
            request.num_frames,
            size,
            ranking_mode(&mode).as_str()
        ));

        let frames = sample_frames(
            self.decoder.as_ref(),
            &request.video_path,
            request.num_frames as usize,
        )
        .await?;
        metrics::record_frames_sampled(frames.len());
        logger.log_stage("frames_extracted", &format!("{} frames", frames.len()));

        let renderer = self.renderer.clone();
        let output_dir = request.output_dir.clone();
        let all_paths = tokio::task::spawn_blocking(move || {
            renderer.render_all(&frames, size, &output_dir)
        })
        .await??;
        metrics::record_thumbnails_rendered(all_paths.len());
        logger.log_stage("thumbnails_rendered", &format!("{} thumbnails", all_paths.len()));

        let (prompt, ranked) = match &mode {
            SelectionMode::UserPrompt(raw) => {
                let refined = self.refiner.refine(raw).await;
                if !refined.is_refined() {
                    logger.log_warning("ranking with the unrefined prompt");
                }
                let ranked = self.rank_single(all_paths.clone(), refined.text()).await?;
                logger.log_stage("ranked_by_user_prompt", refined.text());
                (refined, ranked)
            }
            SelectionMode::DefaultEnsemble => {
                let ranked = self.rank_two_stage(all_paths.clone()).await?;
                logger.log_stage(
                    "ranked_by_ensemble",
                    &format!("{} prompts + description", self.ensemble_prompts.len()),
                );
                let prompt = RefinedPrompt::Unrefined {
                    text: self.default_description.clone(),
                    reason: DEFAULT_DESCRIPTION_REASON.to_string(),
                };
                (prompt, ranked)
            }
        };

        let best_thumbnail = ranked
            .first()
            .cloned()
            .ok_or_else(|| MlError::Internal("ranking returned no thumbnails".to_string()))?;

        Ok(ThumbnailSelection {
            run_id,
            all_thumbnail_paths: all_paths,
            ranked_thumbnail_paths: ranked,
            best_thumbnail,
            mode: ranking_mode(&mode),
            prompt,
            size,
            generated_at: Utc::now(),
        })
    }

    async fn rank_single(&self, paths: Vec<PathBuf>, prompt: &str) -> WorkerResult<Vec<PathBuf>> {
        let model = Arc::clone(&self.model);
        let prompt = prompt.to_string();
        let ranked =
            tokio::task::spawn_blocking(move || rank_with_prompt(model.as_ref(), &paths, &prompt))
                .await??;
        Ok(ranked)
    }

    /// Ensemble order first, then the description re-ranks that whole order.
    async fn rank_two_stage(&self, paths: Vec<PathBuf>) -> WorkerResult<Vec<PathBuf>> {
        let model = Arc::clone(&self.model);
        let prompts = self.ensemble_prompts.clone();
        let description = self.default_description.clone();

        let ranked = tokio::task::spawn_blocking(move || {
            let order = rank_with_ensemble(model.as_ref(), &paths, &prompts)?;
            debug!(order = ?order, "Ensemble order");
            let reordered: Vec<PathBuf> = order.iter().map(|&i| paths[i].clone()).collect();
            rank_with_prompt(model.as_ref(), &reordered, &description)
        })
        .await??;
        Ok(ranked)
    }
}

fn ranking_mode(mode: &SelectionMode) -> RankingMode {
    match mode {
        SelectionMode::UserPrompt(_) => RankingMode::UserPrompt,
        SelectionMode::DefaultEnsemble => RankingMode::DefaultEnsemble,
    }
}

/// Check the request and return the size to render.
fn validate_request(request: &ThumbnailRequest) -> WorkerResult<TargetSize> {
    if request.video_path.as_os_str().is_empty() {
        return Err(WorkerError::config_error("video path is empty"));
    }
    request.validate()?;
    if !request.video_path.is_file() {
        return Err(WorkerError::config_error(format!(
            "video not found: {}",
            request.video_path.display()
        )));
    }
    request
        .primary_size()
        .ok_or_else(|| WorkerError::config_error("no target size given"))
}
