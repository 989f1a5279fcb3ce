//! Gemini `generateContent` client with Google Search grounding.

use super::{build_prompt, RecipeClient, RecipeError, Source, Suggestion, DEFAULT_RECIPE_TIMEOUT};
use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            timeout: DEFAULT_RECIPE_TIMEOUT,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct GeminiRecipeClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiRecipeClient {
    /// Builds the HTTP client. A missing API key is reported per call.
    pub fn new(config: GeminiConfig) -> Result<Self, RecipeError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(RecipeError::Transport)?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }

    fn map_transport(&self, err: reqwest::Error) -> RecipeError {
        if err.is_timeout() {
            RecipeError::Timeout(self.config.timeout)
        } else {
            RecipeError::Transport(err)
        }
    }
}

#[async_trait]
impl RecipeClient for GeminiRecipeClient {
    async fn suggest(
        &self,
        query: &str,
        stocked_names: &[String],
    ) -> Result<Suggestion, RecipeError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(RecipeError::MissingCredentials)?;
        if query.trim().is_empty() {
            return Err(RecipeError::EmptyQuery);
        }

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart {
                    text: build_prompt(query.trim(), stocked_names),
                }],
            }],
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
        };

        let started_at = Instant::now();
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| self.map_transport(err))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| self.map_transport(err))?;
        if !status.is_success() {
            warn!(
                "event=recipe_suggest module=recipe status=error http_status={} duration_ms={}",
                status.as_u16(),
                started_at.elapsed().as_millis()
            );
            return Err(RecipeError::Status {
                code: status.as_u16(),
                message: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|err| RecipeError::InvalidResponse(err.to_string()))?;
        let suggestion = extract_suggestion(parsed);

        info!(
            "event=recipe_suggest module=recipe status=ok ingredients={} text_chars={} sources={} duration_ms={}",
            stocked_names.len(),
            suggestion.text.chars().count(),
            suggestion.sources.len(),
            started_at.elapsed().as_millis()
        );
        Ok(suggestion)
    }
}

fn extract_suggestion(response: GenerateContentResponse) -> Suggestion {
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Suggestion::default();
    };

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|part| !part.thought)
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    let sources = candidate
        .grounding_metadata
        .map(|metadata| {
            metadata
                .grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.web)
                .map(|web| Source {
                    title: web.title,
                    uri: web.uri,
                })
                .collect()
        })
        .unwrap_or_default();

    Suggestion { text, sources }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    tools: Vec<Tool>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Serialize)]
struct GoogleSearch {}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}
