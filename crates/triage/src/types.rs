//! Shared value types for the triage domain.
//!
//! Every value here is ephemeral: constructed per coordinator invocation, held
//! for the duration of one fan-out, and handed to the presentation layer.
//! Nothing is persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder shown for a result field the model did not supply.
pub const NOT_AVAILABLE: &str = "N/A";

// ---------------------------------------------------------------------------
// Token budget
// ---------------------------------------------------------------------------

/// Number of tokens a completion request may generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenCount(u64);

impl TokenCount {
    /// Creates a [`TokenCount`] from a raw integer.
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    /// Returns the underlying integer value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TokenCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Completion requests
// ---------------------------------------------------------------------------

/// Author of a message in a completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Fixed persona instruction for the task.
    System,
    /// The operator-derived prompt.
    User,
}

/// One role-tagged message sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A fully built request for the completion service.
///
/// The model identifier is not part of the request: it is fixed by the
/// [`crate::CompletionClient`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Ordered messages; the system instruction always comes first.
    pub messages: Vec<ChatMessage>,
    /// Upper bound on generated tokens.
    pub max_tokens: TokenCount,
}

impl CompletionRequest {
    /// Returns the content of the first system message, if any.
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }

    /// Returns the content of the last user message, if any.
    pub fn user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// The three independent analyses run for every exception report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskName {
    Classification,
    Resolution,
    Explanation,
}

impl TaskName {
    /// Every task, in submission order.
    pub const ALL: [TaskName; 3] = [
        TaskName::Classification,
        TaskName::Resolution,
        TaskName::Explanation,
    ];

    /// Returns the key this task's result is stored under.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskName::Classification => "classification",
            TaskName::Resolution => "resolution",
            TaskName::Explanation => "explanation",
        }
    }

    /// Returns the JSON contract the task's output must satisfy, or `None`
    /// for free-text output.
    pub fn response_shape(self) -> Option<ResponseShape> {
        match self {
            TaskName::Classification => Some(ResponseShape::Classification),
            TaskName::Resolution => Some(ResponseShape::Resolution),
            TaskName::Explanation => None,
        }
    }
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON contracts for machine-parsed task output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseShape {
    /// Keys `type`, `priority`, `complexity`.
    Classification,
    /// Keys `suggestion`, `confidence`, `rationale`.
    Resolution,
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Operator-supplied description of a fund-administration exception.
///
/// Opaque: no structure is parsed and no length or content is enforced. An
/// empty report is valid; the completion service decides what to do with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExceptionReport(String);

impl ExceptionReport {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ExceptionReport {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for ExceptionReport {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

// ---------------------------------------------------------------------------
// Structured results
// ---------------------------------------------------------------------------

/// Category, severity, and size of an exception as judged by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(rename = "type")]
    pub kind: String,
    pub priority: String,
    pub complexity: String,
}

impl ClassificationResult {
    /// Reads a classification the way the dashboard does: any JSON object is
    /// accepted, missing or null fields become [`NOT_AVAILABLE`], and
    /// non-string values are shown in their JSON form.
    ///
    /// # Errors
    ///
    /// Fails if `text` is not JSON or is JSON but not an object.
    pub fn from_json_lenient(text: &str) -> Result<Self, serde_json::Error> {
        let object = parse_object(text)?;
        Ok(Self {
            kind: field_or_placeholder(&object, "type"),
            priority: field_or_placeholder(&object, "priority"),
            complexity: field_or_placeholder(&object, "complexity"),
        })
    }

    /// Serialises to a JSON object string with the contract keys.
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "type": self.kind,
            "priority": self.priority,
            "complexity": self.complexity,
        })
        .to_string()
    }
}

/// A suggested corrective action with a percentage-string confidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub suggestion: String,
    /// Percentage string, e.g. `"85%"`.
    pub confidence: String,
    pub rationale: String,
}

impl ResolutionResult {
    /// Lenient reader, see [`ClassificationResult::from_json_lenient`].
    ///
    /// # Errors
    ///
    /// Fails if `text` is not JSON or is JSON but not an object.
    pub fn from_json_lenient(text: &str) -> Result<Self, serde_json::Error> {
        let object = parse_object(text)?;
        Ok(Self {
            suggestion: field_or_placeholder(&object, "suggestion"),
            confidence: field_or_placeholder(&object, "confidence"),
            rationale: field_or_placeholder(&object, "rationale"),
        })
    }

    /// Serialises to a JSON object string with the contract keys.
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "suggestion": self.suggestion,
            "confidence": self.confidence,
            "rationale": self.rationale,
        })
        .to_string()
    }

    /// Parses the confidence as a fraction in `[0.0, 1.0]`.
    ///
    /// Accepts `"85%"`, `"85"` and `"85.5 %"`; values outside `0..=100` are
    /// clamped. Returns `None` when the text is not a number.
    pub fn confidence_fraction(&self) -> Option<f64> {
        let trimmed = self.confidence.trim().trim_end_matches('%').trim_end();
        let percent: f64 = trimmed.parse().ok()?;
        if !percent.is_finite() {
            return None;
        }
        Some((percent / 100.0).clamp(0.0, 1.0))
    }
}

fn parse_object(text: &str) -> Result<serde_json::Map<String, Value>, serde_json::Error> {
    match serde_json::from_str(text)? {
        Value::Object(object) => Ok(object),
        _ => Err(<serde_json::Error as serde::de::Error>::custom(
            "expected a JSON object",
        )),
    }
}

fn field_or_placeholder(object: &serde_json::Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(other) => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Output mapping
// ---------------------------------------------------------------------------

/// Display-ready output of one coordinator invocation, keyed by task.
///
/// A complete mapping holds exactly one entry per [`TaskName`]. The empty
/// mapping is the sentinel for "no results are available".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriageResults(BTreeMap<TaskName, String>);

impl TriageResults {
    /// The "no results available" sentinel.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Stores the display text for `task`, replacing any previous entry.
    pub fn insert(&mut self, task: TaskName, text: impl Into<String>) {
        self.0.insert(task, text.into());
    }

    pub fn get(&self, task: TaskName) -> Option<&str> {
        self.0.get(&task).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaskName, &str)> {
        self.0.iter().map(|(task, text)| (*task, text.as_str()))
    }
}
