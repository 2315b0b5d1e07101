//! The fan-out coordinator.
//!
//! One invocation spawns exactly one worker per [`TaskName`] on the current
//! tokio runtime, waits for every worker, and keys each outcome by task. The
//! workers share nothing but the completion client handle and the input text,
//! and are aborted if the invocation is dropped before they finish.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tracing::{info, info_span, warn, Instrument};
use triage::prompts;
use triage::{
    check_json, render_outcome, CompletionClient, TaskError, TaskName, TaskOutcome, TriageError,
    TriageResults, TriageRunId,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What the explanation agent is asked to explain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExplanationSource {
    /// The raw exception text. All three agents run in parallel.
    #[default]
    Exception,
    /// The resolution agent's output. The explanation waits for the resolution
    /// agent; classification still runs in parallel with both.
    Resolution,
}

impl ExplanationSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ExplanationSource::Exception => "exception",
            ExplanationSource::Resolution => "resolution",
        }
    }
}

impl std::fmt::Display for ExplanationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExplanationSource {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exception" => Ok(ExplanationSource::Exception),
            "resolution" => Ok(ExplanationSource::Resolution),
            other => Err(TriageError::Configuration {
                message: format!(
                    "unknown explanation source '{other}' (expected 'exception' or 'resolution')"
                ),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Tagged per-task outcomes of one invocation, before display rendering.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TriageOutcomes(BTreeMap<TaskName, TaskOutcome>);

impl TriageOutcomes {
    pub fn get(&self, task: TaskName) -> Option<&TaskOutcome> {
        self.0.get(&task)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaskName, &TaskOutcome)> {
        self.0.iter().map(|(task, outcome)| (*task, outcome))
    }

    /// Number of tasks that failed.
    pub fn failure_count(&self) -> usize {
        self.0.values().filter(|o| o.is_err()).count()
    }

    /// Converts every outcome into its display string.
    pub fn render(&self) -> TriageResults {
        let mut results = TriageResults::empty();
        for (task, outcome) in &self.0 {
            results.insert(*task, render_outcome(*task, outcome));
        }
        results
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Runs the three triage agents concurrently against one exception report.
///
/// Cheap to clone; every clone shares the same client handle.
#[derive(Clone)]
pub struct TriageCoordinator {
    client: Arc<dyn CompletionClient>,
    explanation_source: ExplanationSource,
}

impl std::fmt::Debug for TriageCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriageCoordinator")
            .field("explanation_source", &self.explanation_source)
            .finish_non_exhaustive()
    }
}

impl TriageCoordinator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            explanation_source: ExplanationSource::default(),
        }
    }

    #[must_use]
    pub fn with_explanation_source(mut self, source: ExplanationSource) -> Self {
        self.explanation_source = source;
        self
    }

    pub fn explanation_source(&self) -> ExplanationSource {
        self.explanation_source
    }

    /// Runs all three agents and returns their display strings keyed by task.
    ///
    /// Never fails. A failing agent yields a fallback payload (classification,
    /// resolution) or an `"Error: …"` string (explanation) in its own slot.
    /// If the agents cannot be started at all, the empty mapping is returned.
    pub async fn process(&self, exception_details: &str) -> TriageResults {
        match self.process_detailed(exception_details).await {
            Ok(outcomes) => outcomes.render(),
            Err(err) => {
                warn!(error = %err, "triage could not start; returning no results");
                TriageResults::empty()
            }
        }
    }

    /// Runs all three agents and returns their tagged outcomes.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::RuntimeUnavailable`] when called outside a tokio
    /// runtime. Agent failures are never returned here; they are recorded in
    /// the outcome of the agent that failed.
    pub async fn process_detailed(
        &self,
        exception_details: &str,
    ) -> Result<TriageOutcomes, TriageError> {
        if Handle::try_current().is_err() {
            return Err(TriageError::RuntimeUnavailable);
        }

        let run_id = TriageRunId::new_random();
        let span = info_span!(
            "triage",
            %run_id,
            input_len = exception_details.len(),
            explanation_source = %self.explanation_source
        );

        let outcomes = self.fan_out(exception_details).instrument(span).await;
        Ok(outcomes)
    }

    async fn fan_out(&self, exception_details: &str) -> TriageOutcomes {
        let started = Instant::now();
        let input: Arc<str> = Arc::from(exception_details);

        let mut workers = Workers::default();
        match self.explanation_source {
            ExplanationSource::Exception => {
                for task in TaskName::ALL {
                    let client = Arc::clone(&self.client);
                    workers.spawn(task, run_agent(client, task, Arc::clone(&input)));
                }
            }
            ExplanationSource::Resolution => self.spawn_chained(&mut workers, input),
        }

        let outcomes = workers.join().await;

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            failures = outcomes.failure_count(),
            "triage finished"
        );
        outcomes
    }

    /// Spawns classification on its own and the explanation behind the
    /// resolution, handing the resolution outcome over a oneshot channel.
    fn spawn_chained(&self, workers: &mut Workers, input: Arc<str>) {
        let client = Arc::clone(&self.client);
        workers.spawn(
            TaskName::Classification,
            run_agent(client, TaskName::Classification, Arc::clone(&input)),
        );

        let (tx, rx) = oneshot::channel::<TaskOutcome>();

        let client = Arc::clone(&self.client);
        workers.spawn(TaskName::Resolution, async move {
            let outcome = run_agent(client, TaskName::Resolution, input).await;
            // The receiver is gone only if the explanation worker died.
            let _ = tx.send(outcome.clone());
            outcome
        });

        let client = Arc::clone(&self.client);
        workers.spawn(TaskName::Explanation, async move {
            match rx.await {
                Ok(Ok(suggestion)) => {
                    run_agent(client, TaskName::Explanation, Arc::from(suggestion)).await
                }
                Ok(Err(err)) => Err(TaskError::Unexpected {
                    detail: format!("resolution suggestion unavailable: {err}"),
                }),
                Err(_) => Err(TaskError::Unexpected {
                    detail: "resolution agent ended without a result".to_string(),
                }),
            }
        });
    }
}

/// The workers of one invocation, one slot per task.
///
/// Dropping it aborts every worker still running, so no completion call
/// outlives the invocation that started it.
#[derive(Default)]
struct Workers {
    set: JoinSet<TaskOutcome>,
    slots: HashMap<tokio::task::Id, TaskName>,
}

impl Workers {
    fn spawn<F>(&mut self, task: TaskName, work: F)
    where
        F: Future<Output = TaskOutcome> + Send + 'static,
    {
        let handle = self.set.spawn(work.instrument(info_span!("task", %task)));
        self.slots.insert(handle.id(), task);
    }

    /// Waits for every worker. A worker that panicked or was cancelled
    /// yields [`TaskError::Unexpected`] in its own slot.
    async fn join(mut self) -> TriageOutcomes {
        let mut outcomes = TriageOutcomes::default();
        while let Some(joined) = self.set.join_next_with_id().await {
            let (id, result) = match joined {
                Ok((id, outcome)) => (id, Ok(outcome)),
                Err(join_err) => (join_err.id(), Err(join_err)),
            };
            let Some(task) = self.slots.remove(&id) else {
                continue;
            };
            let outcome = result.unwrap_or_else(|join_err| {
                warn!(%task, error = %join_err, "agent worker did not complete");
                Err(TaskError::Unexpected {
                    detail: join_err.to_string(),
                })
            });
            outcomes.0.insert(task, outcome);
        }
        outcomes
    }
}

/// One agent: build the request, make a single completion call, and check
/// the JSON contract where the task has one.
async fn run_agent(
    client: Arc<dyn CompletionClient>,
    task: TaskName,
    input: Arc<str>,
) -> TaskOutcome {
    let request = prompts::request_for(task, &input);
    let started = Instant::now();

    let outcome = match client.complete(&request).await {
        Ok(text) if task.response_shape().is_some() => check_json(text),
        Ok(text) => Ok(text),
        Err(err) => Err(TaskError::Provider(err)),
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &outcome {
        Ok(text) => info!(elapsed_ms, response_len = text.len(), "agent completed"),
        Err(err) => warn!(elapsed_ms, error = %err, "agent failed"),
    }
    outcome
}
