//! Text tokenization for the CLIP text encoder.

use std::path::Path;

use tokenizers::Tokenizer;
use tracing::debug;

use crate::error::{MlError, MlResult};

/// Token-level view of a prompt, as the embedding model sees it.
pub trait PromptTokenizer: Send + Sync {
    /// Token ids for `text`, without special tokens.
    fn encode(&self, text: &str) -> MlResult<Vec<u32>>;

    /// Text for `ids`, skipping special tokens.
    fn decode(&self, ids: &[u32]) -> MlResult<String>;
}

/// Cut `text` down to at most `budget` tokens.
///
/// Text that already fits is returned untouched, so applying this twice
/// gives the same result as applying it once.
pub fn truncate_to_budget(
    tokenizer: &dyn PromptTokenizer,
    text: &str,
    budget: usize,
) -> MlResult<String> {
    let ids = tokenizer.encode(text)?;
    if ids.len() <= budget {
        return Ok(text.to_string());
    }

    debug!(tokens = ids.len(), budget, "Truncating prompt");
    tokenizer.decode(&ids[..budget])
}

/// Model-ready token ids and attention mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInput {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
}

impl TextInput {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

/// HuggingFace `tokenizer.json` backed CLIP tokenizer.
pub struct ClipTokenizer {
    inner: Tokenizer,
}

impl ClipTokenizer {
    pub fn from_file(path: &Path) -> MlResult<Self> {
        if !path.exists() {
            return Err(MlError::ModelNotFound(path.to_path_buf()));
        }

        let inner = Tokenizer::from_file(path)
            .map_err(|e| MlError::tokenizer(format!("load {}: {e}", path.display())))?;
        Self::new(inner)
    }

    /// Wrap an already loaded tokenizer.
    pub fn new(mut inner: Tokenizer) -> MlResult<Self> {
        // Length is handled here, not by the tokenizer's own config.
        inner.with_padding(None);
        inner
            .with_truncation(None)
            .map_err(|e| MlError::tokenizer(format!("disable truncation: {e}")))?;

        Ok(Self { inner })
    }

    /// Encode with BOS/EOS for the text encoder, capped at `max_len`
    /// positions with the final (EOS) token kept.
    pub fn model_input(&self, text: &str, max_len: usize) -> MlResult<TextInput> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| MlError::tokenizer(format!("encode: {e}")))?;

        let ids = cap_keep_last(encoding.get_ids(), max_len);
        if ids.is_empty() {
            return Err(MlError::tokenizer("prompt encoded to zero tokens"));
        }

        Ok(TextInput {
            attention_mask: vec![1; ids.len()],
            input_ids: ids.into_iter().map(i64::from).collect(),
        })
    }
}

impl PromptTokenizer for ClipTokenizer {
    fn encode(&self, text: &str) -> MlResult<Vec<u32>> {
        self.inner
            .encode(text, false)
            .map(|encoding| encoding.get_ids().to_vec())
            .map_err(|e| MlError::tokenizer(format!("encode: {e}")))
    }

    fn decode(&self, ids: &[u32]) -> MlResult<String> {
        self.inner
            .decode(ids, true)
            .map_err(|e| MlError::tokenizer(format!("decode: {e}")))
    }
}

/// First `max_len - 1` ids followed by the last id.
fn cap_keep_last(ids: &[u32], max_len: usize) -> Vec<u32> {
    if ids.len() <= max_len || max_len == 0 {
        return ids.iter().copied().take(max_len).collect();
    }
    let mut capped = ids[..max_len - 1].to_vec();
    capped.extend(ids.last().copied());
    capped
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One token per whitespace-separated word.
    struct WordTokenizer;

    impl PromptTokenizer for WordTokenizer {
        fn encode(&self, text: &str) -> MlResult<Vec<u32>> {
            Ok(text
                .split_whitespace()
                .map(|w| w.len() as u32)
                .collect())
        }

        fn decode(&self, ids: &[u32]) -> MlResult<String> {
            Ok(ids
                .iter()
                .map(|&n| "x".repeat(n as usize))
                .collect::<Vec<_>>()
                .join(" "))
        }
    }

    #[test]
    fn test_short_text_is_returned_verbatim() {
        let text = "Bold  colors,   dramatic contrast!";
        assert_eq!(truncate_to_budget(&WordTokenizer, text, 77).unwrap(), text);
    }

    #[test]
    fn test_long_text_is_cut_to_budget() {
        let text = vec!["word"; 100].join(" ");
        let out = truncate_to_budget(&WordTokenizer, &text, 77).unwrap();
        assert_eq!(WordTokenizer.encode(&out).unwrap().len(), 77);
    }

    #[test]
    fn test_truncation_is_idempotent() {
        let text = vec!["abc"; 90].join(" ");
        let once = truncate_to_budget(&WordTokenizer, &text, 77).unwrap();
        let twice = truncate_to_budget(&WordTokenizer, &once, 77).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_cap_keeps_eos() {
        let ids: Vec<u32> = (0..100).collect();
        let capped = cap_keep_last(&ids, 77);
        assert_eq!(capped.len(), 77);
        assert_eq!(capped[75], 75);
        assert_eq!(capped[76], 99);

        assert_eq!(cap_keep_last(&[1, 2, 3], 77), vec![1, 2, 3]);
    }

    /// Word-level vocabulary with CLIP's BOS/EOS wrapped around every input.
    const TINY_TOKENIZER: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [
            {"id": 0, "content": "<|startoftext|>", "single_word": false, "lstrip": false,
             "rstrip": false, "normalized": false, "special": true},
            {"id": 1, "content": "<|endoftext|>", "single_word": false, "lstrip": false,
             "rstrip": false, "normalized": false, "special": true}
        ],
        "normalizer": null,
        "pre_tokenizer": {"type": "Whitespace"},
        "post_processor": {
            "type": "TemplateProcessing",
            "single": [
                {"SpecialToken": {"id": "<|startoftext|>", "type_id": 0}},
                {"Sequence": {"id": "A", "type_id": 0}},
                {"SpecialToken": {"id": "<|endoftext|>", "type_id": 0}}
            ],
            "pair": [
                {"SpecialToken": {"id": "<|startoftext|>", "type_id": 0}},
                {"Sequence": {"id": "A", "type_id": 0}},
                {"Sequence": {"id": "B", "type_id": 1}},
                {"SpecialToken": {"id": "<|endoftext|>", "type_id": 0}}
            ],
            "special_tokens": {
                "<|startoftext|>": {"id": "<|startoftext|>", "ids": [0], "tokens": ["<|startoftext|>"]},
                "<|endoftext|>": {"id": "<|endoftext|>", "ids": [1], "tokens": ["<|endoftext|>"]}
            }
        },
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": {
                "<|startoftext|>": 0, "<|endoftext|>": 1, "<unk>": 2,
                "bold": 3, "neon": 4, "skyline": 5, "at": 6, "dusk": 7
            },
            "unk_token": "<unk>"
        }
    }"#;

    fn tiny_clip_tokenizer() -> ClipTokenizer {
        let inner: Tokenizer = TINY_TOKENIZER.parse().unwrap();
        ClipTokenizer::new(inner).unwrap()
    }

    #[test]
    fn test_model_input_wraps_prompt_in_bos_eos() {
        let input = tiny_clip_tokenizer()
            .model_input("neon skyline at dusk", 77)
            .unwrap();

        assert_eq!(input.input_ids, vec![0, 4, 5, 6, 7, 1]);
        assert_eq!(input.attention_mask, vec![1; 6]);
    }

    #[test]
    fn test_model_input_caps_long_prompts_keeping_bos_and_eos() {
        let text = vec!["bold"; 100].join(" ");
        let input = tiny_clip_tokenizer().model_input(&text, 77).unwrap();

        assert_eq!(input.len(), 77);
        assert_eq!(input.attention_mask.len(), 77);
        assert_eq!(input.input_ids.first(), Some(&0));
        assert_eq!(input.input_ids.last(), Some(&1));
        assert!(input.input_ids[1..76].iter().all(|&id| id == 3));
    }

    #[test]
    fn test_prompt_tokenizer_skips_special_tokens() {
        let tokenizer = tiny_clip_tokenizer();

        assert_eq!(PromptTokenizer::encode(&tokenizer, "bold neon").unwrap(), vec![3, 4]);
        assert_eq!(
            PromptTokenizer::decode(&tokenizer, &[0, 3, 4, 1]).unwrap(),
            "bold neon"
        );
    }

    #[test]
    fn test_truncation_with_real_tokenizer() {
        let tokenizer = tiny_clip_tokenizer();
        let text = vec!["neon skyline"; 50].join(" ");

        let out = truncate_to_budget(&tokenizer, &text, 77).unwrap();
        assert_eq!(out.split_whitespace().count(), 77);
        assert_eq!(truncate_to_budget(&tokenizer, &out, 77).unwrap(), out);

        let short = "bold neon skyline";
        assert_eq!(truncate_to_budget(&tokenizer, short, 77).unwrap(), short);
    }

    #[test]
    fn test_missing_tokenizer_file() {
        let result = ClipTokenizer::from_file(Path::new("/nonexistent/tokenizer.json"));
        assert!(matches!(result, Err(MlError::ModelNotFound(_))));
    }
}
