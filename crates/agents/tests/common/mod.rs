//! Scripted in-memory completion client shared by the coordinator tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use triage::prompts::{
    CLASSIFICATION_SYSTEM_PROMPT, EXPLANATION_SYSTEM_PROMPT, RESOLUTION_SYSTEM_PROMPT,
};
use triage::{CompletionClient, CompletionError, CompletionRequest, TaskName};

pub const SAMPLE_EXCEPTION: &str = "Trade break: settlement mismatch of $500 on trade #12345";
pub const CLASSIFICATION_JSON: &str =
    r#"{"type":"Settlement Mismatch","priority":"High","complexity":"Medium"}"#;
pub const RESOLUTION_JSON: &str = r#"{"suggestion":"Rebook the trade at the custodian price","confidence":"85%","rationale":"Custodian confirmation matches the counterparty"}"#;
pub const EXPLANATION_TEXT: &str =
    "The trade settled at a different amount than booked; rebooking aligns the records.";

/// What the stub does when it receives a request for a task.
#[derive(Debug, Clone)]
pub enum Script {
    Reply(String),
    Fail(CompletionError),
    Panic(&'static str),
    /// Never answers. The flag is raised once the pending call is dropped.
    Hang(Arc<AtomicBool>),
}

struct RaiseOnDrop(Arc<AtomicBool>);

impl Drop for RaiseOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Answers each request according to the script registered for its task and
/// records every request it receives.
#[derive(Default)]
pub struct ScriptedClient {
    scripts: HashMap<TaskName, Script>,
    requests: Mutex<Vec<(TaskName, CompletionRequest)>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client answering every task with well-formed output.
    pub fn happy() -> Self {
        Self::new()
            .with(TaskName::Classification, Script::Reply(CLASSIFICATION_JSON.into()))
            .with(TaskName::Resolution, Script::Reply(RESOLUTION_JSON.into()))
            .with(TaskName::Explanation, Script::Reply(EXPLANATION_TEXT.into()))
    }

    pub fn with(mut self, task: TaskName, script: Script) -> Self {
        self.scripts.insert(task, script);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn requests_for(&self, task: TaskName) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| *t == task)
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

fn task_of(request: &CompletionRequest) -> TaskName {
    match request.system_prompt() {
        Some(CLASSIFICATION_SYSTEM_PROMPT) => TaskName::Classification,
        Some(RESOLUTION_SYSTEM_PROMPT) => TaskName::Resolution,
        Some(EXPLANATION_SYSTEM_PROMPT) => TaskName::Explanation,
        other => panic!("unexpected system prompt: {other:?}"),
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let task = task_of(request);
        self.requests.lock().unwrap().push((task, request.clone()));

        match self.scripts.get(&task) {
            Some(Script::Reply(text)) => Ok(text.clone()),
            Some(Script::Fail(err)) => Err(err.clone()),
            Some(Script::Panic(message)) => panic!("{message}"),
            Some(Script::Hang(dropped)) => {
                let _guard = RaiseOnDrop(Arc::clone(dropped));
                std::future::pending().await
            }
            None => Err(CompletionError::EmptyResponse),
        }
    }
}

pub fn network_error() -> CompletionError {
    CompletionError::Transport {
        message: "simulated network failure: connection refused".to_string(),
    }
}
