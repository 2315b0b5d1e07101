//! OpenAI-compatible chat-completions transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use triage::{
    ChatMessage, CompletionClient, CompletionError, CompletionRequest, ModelId, TriageError,
};

use crate::OpenAiConfig;

/// [`CompletionClient`] backed by `POST {base_url}/chat/completions`.
///
/// Holds one pooled HTTP client with the bearer credential installed, so a
/// single provider can be shared by every concurrent task.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    http: reqwest::Client,
    endpoint: String,
    model: ModelId,
}

impl OpenAiProvider {
    /// Builds the provider and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Configuration`] if the API key is blank or not a
    /// valid header value, or if the HTTP client cannot be constructed.
    pub fn new(config: OpenAiConfig) -> Result<Self, TriageError> {
        if config.api_key.trim().is_empty() {
            return Err(TriageError::Configuration {
                message: "completion provider API key is empty".to_string(),
            });
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key)).map_err(
            |_| TriageError::Configuration {
                message: "completion provider API key contains invalid characters".to_string(),
            },
        )?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| TriageError::Configuration {
            message: format!("failed to create HTTP client: {e}"),
        })?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model,
        })
    }

    pub fn model(&self) -> &ModelId {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionClient for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = ChatCompletionRequest {
            model: self.model.as_str(),
            messages: &request.messages,
            max_tokens: request.max_tokens.as_u64(),
        };
        debug!(
            model = %self.model,
            max_tokens = %request.max_tokens,
            messages = request.messages.len(),
            "sending completion request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let retry_after = response.headers().get(RETRY_AFTER).and_then(parse_retry_after);
        let body_text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let err = status_error(status, retry_after, &body_text);
            warn!(status = status.as_u16(), error = %err, "completion request rejected");
            return Err(err);
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&body_text).map_err(|e| CompletionError::InvalidResponse {
                message: e.to_string(),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(CompletionError::EmptyResponse)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn transport_error(e: reqwest::Error) -> CompletionError {
    let message = match std::error::Error::source(&e) {
        Some(source) => format!("{e}: {source}"),
        None => e.to_string(),
    };
    CompletionError::Transport { message }
}

fn status_error(status: StatusCode, retry_after: Option<Duration>, body: &str) -> CompletionError {
    let message = extract_error_message(body).unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            trimmed.to_string()
        }
    });

    match status.as_u16() {
        401 | 403 => CompletionError::Unauthorized {
            status: status.as_u16(),
            message,
        },
        429 => CompletionError::RateLimited {
            message,
            retry_after,
        },
        code => CompletionError::Api {
            status: code,
            message,
        },
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|message| !message.trim().is_empty())
}

fn parse_retry_after(value: &HeaderValue) -> Option<Duration> {
    value
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
