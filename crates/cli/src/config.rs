//! Runtime configuration: environment variables overlaid with CLI flags.

use std::path::PathBuf;
use std::time::Duration;

use agents::ExplanationSource;
use clap::Parser;
use llm::OpenAiConfig;
use triage::{ModelId, TriageError};

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const TIMEOUT_VAR: &str = "OPENAI_TIMEOUT_SECS";
pub const MODEL_VAR: &str = "TRIAGE_MODEL";
pub const EXPLANATION_SOURCE_VAR: &str = "TRIAGE_EXPLANATION_SOURCE";

/// Classify a fund-administration exception, suggest a resolution, and explain
/// it, using three concurrent model calls.
#[derive(Debug, Parser)]
#[command(name = "fund-triage", version)]
pub struct Cli {
    /// Exception details. Read from --file or stdin when omitted.
    pub exception: Option<String>,

    /// Read exception details from a file.
    #[arg(short, long, conflicts_with = "exception")]
    pub file: Option<PathBuf>,

    /// Completion model to use (overrides TRIAGE_MODEL).
    #[arg(long)]
    pub model: Option<String>,

    /// What the explanation agent explains: `exception` or `resolution`
    /// (overrides TRIAGE_EXPLANATION_SOURCE).
    #[arg(long)]
    pub explanation_source: Option<ExplanationSource>,

    /// Print the raw result mapping as JSON instead of the dashboard.
    #[arg(long)]
    pub json: bool,
}

/// Fully resolved settings for one process run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: OpenAiConfig,
    pub explanation_source: ExplanationSource,
}

impl AppConfig {
    /// Reads the process environment.
    ///
    /// # Errors
    ///
    /// Fails if the API key is missing or any set variable is malformed.
    pub fn from_env() -> Result<Self, TriageError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which returns a variable's value or
    /// `None` when unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TriageError> {
        let api_key = lookup(API_KEY_VAR)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| TriageError::Configuration {
                message: format!("{API_KEY_VAR} must be set"),
            })?;

        let mut provider = OpenAiConfig::new(api_key);

        if let Some(base_url) = lookup(BASE_URL_VAR).filter(|v| !v.trim().is_empty()) {
            provider = provider.with_base_url(base_url);
        }

        if let Some(model) = lookup(MODEL_VAR) {
            provider = provider.with_model(parse_model(&model, MODEL_VAR)?);
        }

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| TriageError::Configuration {
                    message: format!(
                        "{TIMEOUT_VAR} must be a positive whole number of seconds, got '{raw}'"
                    ),
                })?;
            provider = provider.with_timeout(Some(Duration::from_secs(secs)));
        }

        let explanation_source = match lookup(EXPLANATION_SOURCE_VAR) {
            Some(raw) => raw.parse()?,
            None => ExplanationSource::default(),
        };

        Ok(Self {
            provider,
            explanation_source,
        })
    }

    /// Applies command-line overrides on top of the environment settings.
    pub fn with_cli_overrides(mut self, cli: &Cli) -> Result<Self, TriageError> {
        if let Some(model) = &cli.model {
            self.provider = self.provider.with_model(parse_model(model, "--model")?);
        }
        if let Some(source) = cli.explanation_source {
            self.explanation_source = source;
        }
        Ok(self)
    }
}

fn parse_model(raw: &str, origin: &str) -> Result<ModelId, TriageError> {
    ModelId::new(raw.trim()).ok_or_else(|| TriageError::Configuration {
        message: format!("{origin} must not be empty"),
    })
}
