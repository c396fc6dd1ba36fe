//! Gemini `generateContent` client
//!
//! Sends the question as a single user turn, optionally preceded by the
//! configured system instruction, and returns the concatenated text parts
//! of the first candidate. One attempt per call; the per-request timeout
//! comes from config.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{AnsweringCollaborator, UpstreamError};
use crate::config::{ConfigError, GeminiConfig};

/// HTTP client for the Gemini API
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: SecretString,
    system_instruction: Option<String>,
    timeout_ms: u64,
}

impl GeminiClient {
    /// Build from the `gemini` config section; the API key is mandatory
    pub fn from_config(config: &GeminiConfig) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .as_ref()
            .map(|key| key.expose_secret().clone())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingSecret("gemini.api_key"))?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ConfigError::InvalidValue(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            api_key: SecretString::new(api_key),
            system_instruction: config.system_instruction.clone(),
            timeout_ms: config.timeout_ms,
        })
    }

    /// Full `generateContent` URL this client posts to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request<'a>(&'a self, question: &'a str) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: question }],
            }],
            system_instruction: self.system_instruction.as_deref().map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
        }
    }

    fn map_send_error(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout_ms)
        } else {
            UpstreamError::Network(err.to_string())
        }
    }
}

#[async_trait::async_trait]
impl AnsweringCollaborator for GeminiClient {
    async fn answer(&self, question: &str) -> Result<String, UpstreamError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&self.build_request(question))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout(self.timeout_ms)
            } else {
                UpstreamError::InvalidResponse(e.to_string())
            }
        })?;

        body.into_text()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Result<String, UpstreamError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .map(|feedback| feedback.to_string())
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(UpstreamError::InvalidResponse(reason));
        };

        let content = candidate.content.ok_or_else(|| {
            UpstreamError::InvalidResponse(format!(
                "candidate without content (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))
        })?;

        Ok(content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect())
    }
}
