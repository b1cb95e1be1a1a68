//! Similarity ranking of rendered thumbnails.
//!
//! Orders are stable: thumbnails with equal scores keep their input order.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{MlError, MlResult};

/// Image/text similarity: higher means a better match.
pub trait SimilarityModel: Send + Sync {
    /// Score the image at `image` against `text`.
    fn score(&self, image: &Path, text: &str) -> MlResult<f32>;
}

fn checked_score(model: &dyn SimilarityModel, path: &Path, text: &str) -> MlResult<f32> {
    let score = model.score(path, text)?;
    if !score.is_finite() {
        return Err(MlError::NonFiniteScore {
            path: path.to_path_buf(),
            score,
        });
    }
    Ok(score)
}

/// Indices of `scores`, best first. Ties keep index order.
fn descending_order(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
}

/// Rank `paths` by similarity to `prompt`, best first.
pub fn rank_with_prompt(
    model: &dyn SimilarityModel,
    paths: &[PathBuf],
    prompt: &str,
) -> MlResult<Vec<PathBuf>> {
    let scores = paths
        .iter()
        .map(|path| checked_score(model, path, prompt))
        .collect::<MlResult<Vec<f32>>>()?;

    let order = descending_order(&scores);
    if let Some(&best) = order.first() {
        debug!(
            candidates = paths.len(),
            best = %paths[best].display(),
            score = scores[best],
            "Ranked with prompt"
        );
    }

    Ok(order.into_iter().map(|i| paths[i].clone()).collect())
}

/// Rank `paths` by their mean similarity over `prompts`.
///
/// Returns a permutation of `0..paths.len()`, best first.
pub fn rank_with_ensemble<S: AsRef<str>>(
    model: &dyn SimilarityModel,
    paths: &[PathBuf],
    prompts: &[S],
) -> MlResult<Vec<usize>> {
    if prompts.is_empty() {
        return Err(MlError::InvalidArgument(
            "ensemble ranking needs at least one prompt".to_string(),
        ));
    }

    let mut averages = Vec::with_capacity(paths.len());
    for path in paths {
        let mut sum = 0f32;
        for prompt in prompts {
            sum += checked_score(model, path, prompt.as_ref())?;
        }
        averages.push(sum / prompts.len() as f32);
    }

    let order = descending_order(&averages);
    debug!(
        candidates = paths.len(),
        prompts = prompts.len(),
        best = ?order.first(),
        "Ranked with ensemble"
    );
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scores looked up by (file name, prompt); unknown pairs score 0.
    #[derive(Default)]
    struct TableModel {
        scores: HashMap<(String, String), f32>,
        calls: AtomicUsize,
    }

    impl TableModel {
        fn with(mut self, file: &str, prompt: &str, score: f32) -> Self {
            self.scores
                .insert((file.to_string(), prompt.to_string()), score);
            self
        }
    }

    impl SimilarityModel for TableModel {
        fn score(&self, image: &Path, text: &str) -> MlResult<f32> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let name = image.file_name().unwrap().to_string_lossy().to_string();
            Ok(*self.scores.get(&(name, text.to_string())).unwrap_or(&0.0))
        }
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from("out").join(n)).collect()
    }

    #[test]
    fn test_higher_score_ranks_first() {
        let model = TableModel::default().with("a.jpg", "p", 0.9).with("b.jpg", "p", 0.7);
        let ranked = rank_with_prompt(&model, &paths(&["a.jpg", "b.jpg"]), "p").unwrap();
        assert_eq!(ranked, paths(&["a.jpg", "b.jpg"]));

        let model = TableModel::default().with("a.jpg", "p", 0.3).with("b.jpg", "p", 0.9);
        let ranked = rank_with_prompt(&model, &paths(&["a.jpg", "b.jpg"]), "p").unwrap();
        assert_eq!(ranked, paths(&["b.jpg", "a.jpg"]));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let model = TableModel::default()
            .with("a.jpg", "p", 0.5)
            .with("b.jpg", "p", 0.8)
            .with("c.jpg", "p", 0.5)
            .with("d.jpg", "p", 0.8);
        let ranked =
            rank_with_prompt(&model, &paths(&["a.jpg", "b.jpg", "c.jpg", "d.jpg"]), "p").unwrap();
        assert_eq!(ranked, paths(&["b.jpg", "d.jpg", "a.jpg", "c.jpg"]));
    }

    #[test]
    fn test_empty_input_ranks_to_empty() {
        let model = TableModel::default();
        assert!(rank_with_prompt(&model, &[], "p").unwrap().is_empty());
        assert!(rank_with_ensemble(&model, &[], &["p"]).unwrap().is_empty());
    }

    #[test]
    fn test_ensemble_averages_scores() {
        // a: (0.9 + 0.1) / 2 = 0.5, b: (0.6 + 0.6) / 2 = 0.6
        let model = TableModel::default()
            .with("a.jpg", "x", 0.9)
            .with("a.jpg", "y", 0.1)
            .with("b.jpg", "x", 0.6)
            .with("b.jpg", "y", 0.6);
        let order = rank_with_ensemble(&model, &paths(&["a.jpg", "b.jpg"]), &["x", "y"]).unwrap();
        assert_eq!(order, vec![1, 0]);
        assert_eq!(model.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_ensemble_returns_permutation() {
        let names: Vec<String> = (0..7).map(|i| format!("{i}.jpg")).collect();
        let mut model = TableModel::default();
        for (i, name) in names.iter().enumerate() {
            model = model.with(name, "x", (i * 37 % 11) as f32);
        }
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();

        let mut order = rank_with_ensemble(&model, &paths(&name_refs), &["x", "y", "z"]).unwrap();
        order.sort_unstable();
        assert_eq!(order, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_ensemble_without_prompts_is_rejected() {
        let model = TableModel::default();
        let prompts: [&str; 0] = [];
        let result = rank_with_ensemble(&model, &paths(&["a.jpg"]), &prompts);
        assert!(matches!(result, Err(MlError::InvalidArgument(_))));
    }

    #[test]
    fn test_non_finite_score_fails_ranking() {
        let model = TableModel::default().with("a.jpg", "p", f32::NAN);
        let result = rank_with_prompt(&model, &paths(&["a.jpg", "b.jpg"]), "p");
        assert!(matches!(result, Err(MlError::NonFiniteScore { .. })));
    }

    #[test]
    fn test_model_errors_propagate() {
        struct Broken;
        impl SimilarityModel for Broken {
            fn score(&self, _image: &Path, _text: &str) -> MlResult<f32> {
                Err(MlError::inference("session crashed"))
            }
        }

        let result = rank_with_ensemble(&Broken, &paths(&["a.jpg"]), &["x"]);
        assert!(matches!(result, Err(MlError::Inference(_))));
    }
}
