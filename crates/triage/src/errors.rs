//! Error types for the triage domain.
//!
//! Three layers, matching how far a failure may travel:
//!
//! - [`CompletionError`]: one call to the completion provider failed.
//! - [`TaskError`]: one task (classification, resolution, explanation) failed.
//!   It never leaves its own result slot; the coordinator turns it into
//!   display text at its boundary.
//! - [`TriageError`]: the whole invocation could not run, or the process could
//!   not be configured.

use std::time::Duration;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Provider errors
// ---------------------------------------------------------------------------

/// Failure of a single completion call.
///
/// Every call is a single attempt: none of these variants is retried by this
/// workspace. `RateLimited::retry_after` is informational only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    /// The request never produced an HTTP response (DNS, connect, TLS,
    /// timeout, body read).
    #[error("request to completion provider failed: {message}")]
    Transport { message: String },

    /// The provider rejected the credential.
    #[error("completion provider rejected the credentials (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// The provider is throttling this credential.
    #[error("completion provider rate limit exceeded: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Any other non-success status.
    #[error("completion provider returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// A success status whose body is not a chat-completion object.
    #[error("completion provider response could not be decoded: {message}")]
    InvalidResponse { message: String },

    /// A well-formed completion with no choices or no message content.
    #[error("completion provider returned no content")]
    EmptyResponse,
}

// ---------------------------------------------------------------------------
// Per-task errors
// ---------------------------------------------------------------------------

/// Why one task produced no usable output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// The completion call itself failed.
    #[error(transparent)]
    Provider(#[from] CompletionError),

    /// The model answered, but not with the JSON the task requires.
    #[error("{detail}")]
    Format { detail: String },

    /// Anything else: the task panicked or was cancelled, or an upstream task
    /// it depends on produced nothing.
    #[error("{detail}")]
    Unexpected { detail: String },
}

/// What a single task hands back to the coordinator.
pub type TaskOutcome = Result<String, TaskError>;

// ---------------------------------------------------------------------------
// Invocation-level errors
// ---------------------------------------------------------------------------

/// Errors that stop an invocation (or the process) before any task runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriageError {
    /// The runtime configuration is invalid or incomplete.
    ///
    /// Produced at startup; no request is sent with an invalid configuration.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// There is no async runtime to spawn the task workers onto.
    #[error("no async runtime is available to run triage tasks")]
    RuntimeUnavailable,
}
