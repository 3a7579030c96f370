// ABOUTME: OpenAI-compatible chat completions client producing fallback coaching lines
// ABOUTME: Works with Ollama, vLLM, LocalAI, and any cloud endpoint speaking the same API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # `OpenAI`-Compatible Generator
//!
//! ## Configuration
//!
//! - `LOCAL_LLM_BASE_URL`: Base URL (default: <http://localhost:11434/v1> for Ollama)
//! - `LOCAL_LLM_MODEL`: Model to use (default: `qwen2.5:14b-instruct`)
//! - `LOCAL_LLM_API_KEY`: API key (optional, empty for local servers)
//!
//! The fallback gateway already bounds each call with its own timeout; the
//! HTTP timeouts here only stop sockets from lingering.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use pierre_core::errors::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::collaborators::{CoachTextGenerator, GenerationRequest};

/// Environment variable for the base URL
const LOCAL_LLM_BASE_URL_ENV: &str = "LOCAL_LLM_BASE_URL";

/// Environment variable for the model
const LOCAL_LLM_MODEL_ENV: &str = "LOCAL_LLM_MODEL";

/// Environment variable for the API key (optional)
const LOCAL_LLM_API_KEY_ENV: &str = "LOCAL_LLM_API_KEY";

/// Default base URL (Ollama)
const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";

/// Default model
const DEFAULT_MODEL: &str = "qwen2.5:14b-instruct";

const CONNECT_TIMEOUT_SECS: u64 = 5;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Spoken cues must stay short
const MAX_TOKENS: u32 = 60;

const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

impl OpenAiMessage {
    fn new(role: &str, content: String) -> Self {
        Self {
            role: role.to_owned(),
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

/// Endpoint settings
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    /// Base URL for the API (e.g., <http://localhost:11434/v1>)
    pub base_url: String,
    /// API key (optional for local servers)
    pub api_key: Option<String>,
    /// Model to request
    pub model: String,
}

impl Default for OpenAiCompatibleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
        }
    }
}

impl OpenAiCompatibleConfig {
    /// Read `LOCAL_LLM_*` environment variables over the defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            base_url: env::var(LOCAL_LLM_BASE_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned()),
            api_key: env::var(LOCAL_LLM_API_KEY_ENV)
                .ok()
                .filter(|k| !k.is_empty()),
            model: env::var(LOCAL_LLM_MODEL_ENV).unwrap_or_else(|_| DEFAULT_MODEL.to_owned()),
        }
    }
}

/// Generator backed by an `OpenAI`-compatible `/chat/completions` endpoint
pub struct OpenAiCompatibleGenerator {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleGenerator {
    /// Create a generator
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OpenAiCompatibleConfig) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Create a generator from `LOCAL_LLM_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_env() -> AppResult<Self> {
        let config = OpenAiCompatibleConfig::from_env();
        info!(
            "Initializing coaching generator: base_url={}, model={}",
            config.base_url, config.model
        );
        Self::new(config)
    }

    fn api_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn build_messages(request: &GenerationRequest) -> Vec<OpenAiMessage> {
        let mut system = format!(
            "You are {}. Reply with one short spoken coaching line for a runner mid-workout.",
            request.coach_persona
        );
        if !request.recent_history.is_empty() {
            system.push_str(" Do not repeat these recent lines: ");
            system.push_str(&request.recent_history.join(" | "));
        }
        let user = format!("Current conditions: {}", request.conditions.join(", "));
        vec![
            OpenAiMessage::new("system", system),
            OpenAiMessage::new("user", user),
        ]
    }

    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> AppError {
        let detail = serde_json::from_str::<OpenAiErrorResponse>(body).map_or_else(
            |_| body.chars().take(200).collect::<String>(),
            |response| response.error.message,
        );
        AppError::external_service("CoachGenerator", format!("API error ({status}): {detail}"))
    }
}

#[async_trait]
impl CoachTextGenerator for OpenAiCompatibleGenerator {
    #[instrument(skip(self, request), fields(model = %self.config.model))]
    async fn generate(&self, request: &GenerationRequest) -> AppResult<String> {
        let body = OpenAiRequest {
            model: self.config.model.clone(),
            messages: Self::build_messages(request),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            stream: false,
        };

        let mut http_request = self.client.post(self.api_url()).json(&body);
        if let Some(api_key) = &self.config.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = http_request.send().await.map_err(|e| {
            error!("Failed to reach coaching generator: {e}");
            AppError::external_service("CoachGenerator", format!("Failed to connect: {e}"))
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            AppError::external_service("CoachGenerator", format!("Failed to read response: {e}"))
        })?;
        if !status.is_success() {
            return Err(Self::parse_error_response(status, &text));
        }

        let parsed: OpenAiResponse = serde_json::from_str(&text).map_err(|e| {
            AppError::external_service("CoachGenerator", format!("Failed to parse response: {e}"))
        })?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::external_service("CoachGenerator", "API returned no text"))?;

        debug!(chars = content.len(), "Coaching generator replied");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_persona_conditions_and_history() {
        let messages = OpenAiCompatibleGenerator::build_messages(&GenerationRequest {
            coach_persona: "a calm coach".to_owned(),
            conditions: vec!["phase:main".to_owned(), "trend:slowing".to_owned()],
            recent_history: vec!["Relax your shoulders.".to_owned()],
        });
        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.contains("a calm coach"));
        assert!(messages[0].content.contains("Relax your shoulders."));
        assert_eq!(messages[1].content, "Current conditions: phase:main, trend:slowing");
    }
}
