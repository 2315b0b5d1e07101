//! JSON well-formedness checks and fallback payloads.
//!
//! The classification and resolution outputs are consumed by a presentation
//! layer that parses them as JSON. Whatever this module emits for those two
//! tasks is therefore always valid JSON: either the model's text, byte for
//! byte, or a fallback object with the contract's keys.

use serde::de::IgnoredAny;

use crate::{
    ClassificationResult, ResolutionResult, ResponseShape, TaskError, TaskName, TaskOutcome,
};

/// Primary-field value when the model's text is not valid JSON.
pub const INVALID_FORMAT_MESSAGE: &str = "Error: Invalid response format";
/// Primary-field value for every other failure.
pub const SYSTEM_ERROR_MESSAGE: &str = "Error: System error";
/// Confidence reported by a resolution fallback.
pub const FALLBACK_CONFIDENCE: &str = "0%";

/// Confirms that `text` is syntactically valid JSON.
///
/// Only the grammar is checked: no value tree is built, so numbers outside the
/// `f64` range and arbitrarily deep nesting are accepted. On success the
/// original string is returned untouched.
///
/// # Errors
///
/// Returns [`TaskError::Format`] carrying the parser's message.
pub fn check_json(text: String) -> Result<String, TaskError> {
    match serde_json::from_str::<IgnoredAny>(&text) {
        Ok(_) => Ok(text),
        Err(e) => Err(TaskError::Format {
            detail: e.to_string(),
        }),
    }
}

/// Returns `text` unchanged if it is valid JSON, otherwise the fallback
/// payload for `shape`.
pub fn validate_json(shape: ResponseShape, text: &str) -> String {
    match check_json(text.to_string()) {
        Ok(valid) => valid,
        Err(err) => fallback_payload(shape, &err),
    }
}

/// Builds the deterministic substitute for a failed classification or
/// resolution.
pub fn fallback_payload(shape: ResponseShape, err: &TaskError) -> String {
    let (primary, diagnostic_prefix) = match err {
        TaskError::Format { .. } => (INVALID_FORMAT_MESSAGE, "Failed to process the"),
        TaskError::Provider(_) | TaskError::Unexpected { .. } => {
            (SYSTEM_ERROR_MESSAGE, "An unexpected error occurred:")
        }
    };
    let diagnostic = |subject: &str| match err {
        TaskError::Format { detail } => format!("{diagnostic_prefix} {subject}: {detail}"),
        other => format!("{diagnostic_prefix} {other}"),
    };

    match shape {
        ResponseShape::Classification => ClassificationResult {
            kind: primary.to_string(),
            priority: crate::types::NOT_AVAILABLE.to_string(),
            complexity: diagnostic("classification"),
        }
        .to_json(),
        ResponseShape::Resolution => ResolutionResult {
            suggestion: primary.to_string(),
            confidence: FALLBACK_CONFIDENCE.to_string(),
            rationale: diagnostic("suggestion"),
        }
        .to_json(),
    }
}

/// Converts a task's tagged outcome into the string handed to the
/// presentation layer.
///
/// JSON tasks get their text or a fallback payload; the explanation task gets
/// its text or `"Error: <message>"`.
pub fn render_outcome(task: TaskName, outcome: &TaskOutcome) -> String {
    match (outcome, task.response_shape()) {
        (Ok(text), _) => text.clone(),
        (Err(err), Some(shape)) => fallback_payload(shape, err),
        (Err(err), None) => format!("Error: {err}"),
    }
}
