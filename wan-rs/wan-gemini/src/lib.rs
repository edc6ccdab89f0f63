use std::fmt;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wan_config::SessionConfig;

pub const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Gemini API key is missing")]
    MissingApiKey,
    #[error("failed to initialize Gemini client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("Gemini API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("failed to decode Gemini response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Gemini returned no text")]
    EmptyResponse,
}

/// A text-generation backend that turns one payload into one response.
pub trait CompletionService {
    fn generate(&self, payload: &str) -> Result<String, GeminiError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(payload: &'a str, thinking_budget: u32) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: payload }],
            }],
            generation_config: GenerationConfig {
                thinking_config: ThinkingConfig { thinking_budget },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    status: Option<String>,
}

impl GenerateContentResponse {
    /// Joined answer text of the first candidate, excluding thought parts.
    pub(crate) fn into_text(self) -> Result<String, GeminiError> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter(|part| !part.thought)
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GeminiError::EmptyResponse);
        }
        Ok(text)
    }
}

fn endpoint_url(model: &str) -> String {
    format!("{API_BASE_URL}/models/{model}:generateContent")
}

fn api_error(status: u16, body: &str) -> GeminiError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: ErrorBody {
                message,
                status: Some(code),
            },
        }) => format!("{code}: {message}"),
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "empty error body".to_string(),
        Err(_) => body.trim().to_string(),
    };
    GeminiError::Api { status, message }
}

/// Gemini `generateContent` client bound to one session configuration.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    thinking_budget: u32,
}

impl GeminiClient {
    /// Build a client for the configured model.
    ///
    /// # Errors
    ///
    /// Returns [`GeminiError::MissingApiKey`] when the key is empty or
    /// whitespace only, and [`GeminiError::ClientBuild`] when the HTTP client
    /// cannot be constructed.
    pub fn new(config: &SessionConfig) -> Result<Self, GeminiError> {
        if config.api_key.trim().is_empty() {
            return Err(GeminiError::MissingApiKey);
        }

        let http = Client::builder()
            .build()
            .map_err(GeminiError::ClientBuild)?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            thinking_budget: config.thinking_budget,
        })
    }
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("thinking_budget", &self.thinking_budget)
            .finish_non_exhaustive()
    }
}

impl CompletionService for GeminiClient {
    fn generate(&self, payload: &str) -> Result<String, GeminiError> {
        let url = endpoint_url(&self.model);
        let request_body = GenerateContentRequest::new(payload, self.thinking_budget);
        tracing::debug!(model = %self.model, payload_len = payload.len(), "sending generateContent request");

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Gemini request failed");
            return Err(api_error(status.as_u16(), &body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        let text = parsed.into_text()?;
        tracing::debug!(response_len = text.len(), "received Gemini response");
        Ok(text)
    }
}
