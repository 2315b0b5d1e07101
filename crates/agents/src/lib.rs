//! Exception triage agents and the fan-out coordinator.
//!
//! Every exception report is analysed by three agents: classification,
//! resolution suggestion, and explanation. [`TriageCoordinator`] runs them
//! concurrently against one shared [`triage::CompletionClient`], isolates each
//! agent's failure in its own result slot, and converts the tagged outcomes
//! into display strings only at its boundary.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The coordinator sequences calls between the
//! business logic in the [`triage`] crate (prompt builders, JSON validation)
//! and the completion port. It contains no domain rules of its own.

pub mod coordinator;

pub use coordinator::{ExplanationSource, TriageCoordinator, TriageOutcomes};
