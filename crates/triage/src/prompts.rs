//! Request builders for the three triage tasks.
//!
//! Each builder is a pure function: a fixed system persona, a user prompt that
//! embeds the input verbatim, and a fixed token budget. Inputs are never
//! trimmed, validated, or truncated.

use crate::{ChatMessage, CompletionRequest, TaskName, TokenCount};

pub const CLASSIFICATION_SYSTEM_PROMPT: &str = "You are a classification expert.";
pub const RESOLUTION_SYSTEM_PROMPT: &str =
    "You are a resolution suggestion expert. Always return valid JSON.";
pub const EXPLANATION_SYSTEM_PROMPT: &str = "You are an explanation expert.";

pub const CLASSIFICATION_MAX_TOKENS: TokenCount = TokenCount::new(150);
pub const RESOLUTION_MAX_TOKENS: TokenCount = TokenCount::new(200);
pub const EXPLANATION_MAX_TOKENS: TokenCount = TokenCount::new(150);

/// Builds the request that classifies an exception by type, priority, and
/// complexity.
pub fn classification_request(exception_details: &str) -> CompletionRequest {
    let prompt = format!(
        "You are an expert in fund administration exception management. \
         Based on the following exception details, classify the exception by type, priority, and complexity:\n\n\
         {exception_details}\n\n\
         Provide your answer in a JSON format with keys 'type', 'priority', and 'complexity'."
    );
    CompletionRequest {
        messages: vec![
            ChatMessage::system(CLASSIFICATION_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ],
        max_tokens: CLASSIFICATION_MAX_TOKENS,
    }
}

/// Builds the request that suggests a corrective action with a confidence
/// score and rationale.
pub fn resolution_request(exception_details: &str) -> CompletionRequest {
    let prompt = format!(
        "You are a fund administration expert. Given the following exception details and historical resolution patterns, \
         suggest a corrective action. Include a confidence score (as a percentage string) and rationale for your recommendation.\n\n\
         {exception_details}\n\n\
         Present your answer in a valid JSON format with the following structure:\n\
         {{'suggestion': 'your suggestion here', 'confidence': '85%', 'rationale': 'your rationale here'}}"
    );
    CompletionRequest {
        messages: vec![
            ChatMessage::system(RESOLUTION_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ],
        max_tokens: RESOLUTION_MAX_TOKENS,
    }
}

/// Builds the request that explains a resolution suggestion to an operator.
///
/// In the default configuration the coordinator passes the raw exception text
/// here, not the resolution task's output.
pub fn explanation_request(suggestion_details: &str) -> CompletionRequest {
    let prompt = format!(
        "Explain the following resolution suggestion in clear, concise natural language \
         so that an operator can easily understand it:\n\n\
         {suggestion_details}"
    );
    CompletionRequest {
        messages: vec![
            ChatMessage::system(EXPLANATION_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ],
        max_tokens: EXPLANATION_MAX_TOKENS,
    }
}

/// Dispatches to the builder for `task`.
pub fn request_for(task: TaskName, input: &str) -> CompletionRequest {
    match task {
        TaskName::Classification => classification_request(input),
        TaskName::Resolution => resolution_request(input),
        TaskName::Explanation => explanation_request(input),
    }
}
