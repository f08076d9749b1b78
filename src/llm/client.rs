//! Minimal OpenAI-compatible chat client shared by the generators.
//!
//! [`ChatClient`] calls `/v1/chat/completions` with JSON-object output and
//! returns the first choice's message content.  It works with OpenAI, Groq,
//! Ollama (OpenAI mode), LM Studio, vLLM and any provider speaking the same
//! wire format.  All connection details come from [`LlmConfig`].

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::LlmConfig;
use crate::stage::{Stage, StageError, StageErrorKind};

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur while talking to the model.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The caller supplied nothing to work on.
    #[error("{0}")]
    MissingInput(String),

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("LLM request timed out")]
    Timeout,

    /// The API answered with a non-success status.
    #[error("LLM API returned status {0}")]
    Status(u16),

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse LLM response: {0}")]
    Parse(String),

    /// The LLM returned a response with no usable text content.
    #[error("LLM returned an empty response")]
    EmptyResponse,

    /// The content was JSON but not the requested shape.
    #[error("LLM output does not match schema: {0}")]
    Schema(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

impl LlmError {
    /// Report this error as a failed generate stage.
    ///
    /// Missing input keeps its own message; everything else is logged and
    /// collapsed into the generic generation failure the user sees.
    pub fn into_stage_error(self) -> StageError {
        match self {
            LlmError::MissingInput(message) => {
                StageError::new(Stage::Generate, StageErrorKind::MissingInput, message)
            }
            other => {
                log::error!("generate-content: {other}");
                StageError::new(
                    Stage::Generate,
                    StageErrorKind::Generation,
                    "Failed to generate study materials. Please try again.",
                )
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ChatClient
// ---------------------------------------------------------------------------

/// Thin wrapper over `reqwest::Client` + [`LlmConfig`].
#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl ChatClient {
    /// Build from config.  The HTTP client carries the per-request timeout
    /// from `config.timeout_secs`; a default client is used if the builder
    /// fails.
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Send a system + user prompt and return the raw message content.
    ///
    /// The `Authorization: Bearer …` header is attached only when
    /// `config.api_key` is a non-empty string.
    pub async fn complete(&self, system_msg: &str, user_msg: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let body = serde_json::json!({
            "model":       self.config.model,
            "messages": [
                { "role": "system", "content": system_msg },
                { "role": "user",   "content": user_msg   }
            ],
            "stream":          false,
            "temperature":     self.config.temperature,
            "response_format": { "type": "json_object" }
        });

        let mut req = self.client.post(&url).json(&body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Status(status.as_u16()));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(LlmError::EmptyResponse)?
            .trim()
            .to_string();

        if content.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(content)
    }

    /// [`complete`](Self::complete), then parse the content as `T`.
    pub async fn complete_json<T: DeserializeOwned>(
        &self,
        system_msg: &str,
        user_msg: &str,
    ) -> Result<T, LlmError> {
        let content = self.complete(system_msg, user_msg).await?;
        serde_json::from_str(strip_code_fence(&content))
            .map_err(|e| LlmError::Schema(e.to_string()))
    }
}

/// Some models wrap JSON in a Markdown fence despite JSON mode.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
