//! CLIP similarity model on ONNX Runtime.
//!
//! Expects an ONNX export of `openai/clip-vit-base-patch32` with the
//! combined graph:
//! - inputs `input_ids` `[1, T]`, `attention_mask` `[1, T]`,
//!   `pixel_values` `[1, 3, 224, 224]`
//! - output `logits_per_image` `[1, 1]`

use std::path::Path;
use std::sync::Mutex;

use image::RgbImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::info;
use vthumb_models::PROMPT_TOKEN_BUDGET;

use crate::config::ClipConfig;
use crate::error::{MlError, MlResult};
use crate::preprocess::{pixel_shape, preprocess_image};
use crate::ranker::SimilarityModel;
use crate::tokenizer::{ClipTokenizer, PromptTokenizer, TextInput};

/// Loaded CLIP model. Immutable after load; share it behind an `Arc`.
pub struct ClipModel {
    session: Mutex<Session>,
    tokenizer: ClipTokenizer,
}

impl ClipModel {
    /// Load the model and tokenizer named by `config`.
    pub fn load(config: &ClipConfig) -> MlResult<Self> {
        if !config.model_path.exists() {
            return Err(MlError::ModelNotFound(config.model_path.clone()));
        }
        let tokenizer = ClipTokenizer::from_file(&config.tokenizer_path)?;
        let session = create_session(&config.model_path, config.intra_threads)?;

        info!(
            model_path = %config.model_path.display(),
            tokenizer_path = %config.tokenizer_path.display(),
            "CLIP model initialized"
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    /// Raw image/text logit.
    pub fn similarity(&self, image: &RgbImage, text: &str) -> MlResult<f32> {
        let text_input = self.tokenizer.model_input(text, PROMPT_TOKEN_BUDGET)?;
        let (input_ids, attention_mask) = text_tensors(text_input)?;
        let pixels = preprocess_image(image).into_boxed_slice();
        let pixel_values: Value = Tensor::from_array((pixel_shape(), pixels))
            .map(Value::from)
            .map_err(|e| MlError::inference(format!("Failed to create pixel tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| MlError::Internal("Session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "pixel_values" => pixel_values
            ])
            .map_err(|e| MlError::inference(format!("ONNX inference failed: {e}")))?;

        let output = outputs
            .get("logits_per_image")
            .ok_or_else(|| MlError::inference("Missing logits_per_image tensor"))?;

        let (_, logits) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| MlError::inference(format!("Failed to extract tensor: {e}")))?;

        let logit = logits
            .first()
            .copied()
            .ok_or_else(|| MlError::inference("Empty logits_per_image tensor"))?;
        Ok(logit)
    }
}

impl SimilarityModel for ClipModel {
    fn score(&self, image: &Path, text: &str) -> MlResult<f32> {
        let rgb = image::open(image)
            .map_err(|source| MlError::Image {
                path: image.to_path_buf(),
                source,
            })?
            .to_rgb8();
        self.similarity(&rgb, text)
    }
}

impl PromptTokenizer for ClipModel {
    fn encode(&self, text: &str) -> MlResult<Vec<u32>> {
        self.tokenizer.encode(text)
    }

    fn decode(&self, ids: &[u32]) -> MlResult<String> {
        self.tokenizer.decode(ids)
    }
}

fn text_tensors(input: TextInput) -> MlResult<(Value, Value)> {
    let shape = vec![1usize, input.len()];
    let ids = Tensor::from_array((shape.clone(), input.input_ids.into_boxed_slice()))
        .map(Value::from)
        .map_err(|e| MlError::inference(format!("Failed to create input_ids tensor: {e}")))?;
    let mask = Tensor::from_array((shape, input.attention_mask.into_boxed_slice()))
        .map(Value::from)
        .map_err(|e| MlError::inference(format!("Failed to create attention_mask tensor: {e}")))?;
    Ok((ids, mask))
}

fn create_session(model_path: &Path, intra_threads: Option<usize>) -> MlResult<Session> {
    let model_bytes = std::fs::read(model_path)?;

    let mut builder = Session::builder()
        .map_err(|e| MlError::session(format!("ORT session builder: {e}")))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| MlError::session(format!("ORT opt level: {e}")))?;

    if let Some(threads) = intra_threads {
        builder = builder
            .with_intra_threads(threads)
            .map_err(|e| MlError::session(format!("ORT intra threads: {e}")))?;
    }

    builder
        .commit_from_memory(model_bytes.as_slice())
        .map_err(|e| MlError::session(format!("ORT load model: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_load_reports_missing_model() {
        let config = ClipConfig {
            model_path: PathBuf::from("/nonexistent/clip.onnx"),
            ..ClipConfig::default()
        };
        assert!(matches!(
            ClipModel::load(&config),
            Err(MlError::ModelNotFound(path)) if path == config.model_path
        ));
    }
}
