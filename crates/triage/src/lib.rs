//! Core domain for fund-administration exception triage.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, and error type used to turn one free-text exception report into three
//! model responses (classification, resolution suggestion, explanation).
//! Infrastructure crates implement the traits defined here; they never add
//! domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`TriageRunId`, `ModelId`) |
//! | [`types`] | Shared value types (`TokenCount`, `CompletionRequest`, `TriageResults`, etc.) |
//! | [`errors`] | Provider, per-task, and invocation error types |
//! | [`completion`] | The [`CompletionClient`] port |
//! | [`prompts`] | Request builders for the three tasks |
//! | [`validation`] | JSON well-formedness check and fallback payloads |

pub mod completion;
pub mod errors;
pub mod identifiers;
pub mod prompts;
pub mod types;
pub mod validation;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use completion::CompletionClient;
pub use errors::{CompletionError, TaskError, TaskOutcome, TriageError};
pub use identifiers::{ModelId, TriageRunId};
pub use types::{
    ChatMessage, ClassificationResult, CompletionRequest, ExceptionReport, ResolutionResult,
    ResponseShape, Role, TaskName, TokenCount, TriageResults,
};
pub use validation::{check_json, render_outcome, validate_json};
