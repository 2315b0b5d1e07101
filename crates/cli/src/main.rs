//! Exception triage CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Load configuration** — read `.env` (if present) and the process
//!    environment, then apply command-line overrides.
//! 2. **Wire observability** — install a `tracing-subscriber` writing to
//!    stderr. All spans and events emitted by the workspace crates flow
//!    through it.
//! 3. **Construct infrastructure** — build the one `OpenAiProvider` for the
//!    process and inject it into the `TriageCoordinator`.
//! 4. **Run and render** — triage one exception report and print either the
//!    dashboard or the raw result mapping as JSON.

mod config;
mod dashboard;
mod input;
mod logging;

use std::sync::Arc;

use agents::TriageCoordinator;
use anyhow::{bail, Result};
use clap::Parser;
use llm::OpenAiProvider;
use tracing::info;

use crate::config::{AppConfig, Cli};
use crate::dashboard::Dashboard;
use crate::logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(LogFormat::from_env());

    let config = AppConfig::from_env()?.with_cli_overrides(&cli)?;
    let report = input::read_exception(&cli)?;

    let provider = OpenAiProvider::new(config.provider)?;
    info!(
        model = %provider.model(),
        explanation_source = %config.explanation_source,
        input_len = report.as_str().len(),
        "processing exception"
    );

    let coordinator = TriageCoordinator::new(Arc::new(provider))
        .with_explanation_source(config.explanation_source);
    let results = coordinator.process(report.as_str()).await;

    if results.is_empty() {
        bail!("no triage results are available");
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", Dashboard::from_results(&results));
    }
    Ok(())
}
