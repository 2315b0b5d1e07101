//! Provider configuration.

use std::time::Duration;

use triage::ModelId;

/// Connection settings for an OpenAI-compatible completion provider.
///
/// The API key is read once at process start and never logged; the `Debug`
/// implementation redacts it.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    /// Base URL up to and including the API version segment.
    pub base_url: String,
    pub model: ModelId,
    /// Per-request timeout. `None` waits for the provider indefinitely.
    pub timeout: Option<Duration>,
}

impl OpenAiConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    /// Creates a configuration for the public OpenAI API with the default model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model: ModelId::default(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: ModelId) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}
