//! Gemini AI client for prompt refinement.
//!
//! Talks to the `v1beta/models/{model}:generateContent` REST endpoint and
//! walks a chain of models until one answers.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::GeminiConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::refiner::{RefineError, TextGenerator};

/// Header carrying the API key; keeps it out of request URLs.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API client.
pub struct GeminiClient {
    api_key: Option<String>,
    base_url: String,
    models: Vec<String>,
    client: Client,
}

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 1,
            top_p: 1.0,
        }
    }
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiResponse {
    /// Text of the first candidate, all parts joined.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(config: &GeminiConfig) -> WorkerResult<Self> {
        if config.models.is_empty() {
            return Err(WorkerError::config_error("no Gemini models configured"));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| WorkerError::config_error(format!("HTTP client: {e}")))?;

        if config.api_key.is_none() {
            warn!("GEMINI_API_KEY not set; prompts will not be refined");
        }

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            models: config.models.clone(),
            client,
        })
    }

    /// Call Gemini API.
    async fn call_gemini_api(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String, RefineError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, model
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig::default(),
        };

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RefineError::Status { status, body });
        }

        let body = response.text().await?;
        let gemini_response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| RefineError::Malformed(format!("Failed to parse Gemini response: {e}")))?;

        gemini_response.text().ok_or(RefineError::EmptyResponse)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, RefineError> {
        let api_key = self.api_key.as_deref().ok_or(RefineError::MissingApiKey)?;

        let mut last_error = None;
        for model in &self.models {
            debug!("Attempting Gemini API with model: {}", model);
            match self.call_gemini_api(api_key, model, prompt).await {
                Ok(text) => {
                    info!(model = %model, chars = text.len(), "Gemini returned refinement");
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Failed with model {}: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(RefineError::EmptyResponse))
    }
}
