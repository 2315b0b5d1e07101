//! The completion-service port.
//!
//! The coordinator and the prompt builders only ever see this trait; the HTTP
//! transport lives in the `llm` crate. A handle is constructed once at process
//! start and shared by reference-counted pointer with every task.

use async_trait::async_trait;

use crate::{CompletionError, CompletionRequest};

/// A text-completion service that turns role-tagged messages into text.
///
/// Implementations make exactly one attempt per call and surface the
/// provider's failure unchanged; they must not retry.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends `request` and returns the generated text verbatim.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}
