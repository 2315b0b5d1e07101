//! Completion provider infrastructure adapter.
//!
//! Implements the [`triage::CompletionClient`] trait for OpenAI-compatible
//! chat-completions endpoints. Additional providers are added as new `impl`
//! blocks in this crate without any changes to the `triage` crate.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** All HTTP transport, authentication, request formatting,
//! and response parsing live here. The [`triage`] and `agents` crates see only
//! [`triage::CompletionClient`].
//!
//! Every call is a single attempt. Rate-limit responses are reported with the
//! provider's `Retry-After` hint, but nothing in this crate retries.

pub mod config;
pub mod openai;

pub use config::OpenAiConfig;
pub use openai::OpenAiProvider;
