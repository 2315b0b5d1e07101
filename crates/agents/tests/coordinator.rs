mod common;

use std::future::Future;
use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};
use std::time::Duration;

use agents::{ExplanationSource, TriageCoordinator};
use common::{
    network_error, Script, ScriptedClient, CLASSIFICATION_JSON, EXPLANATION_TEXT,
    RESOLUTION_JSON, SAMPLE_EXCEPTION,
};
use serde_json::{json, Value};
use triage::{CompletionError, TaskError, TaskName, TriageError};

fn parse(text: Option<&str>) -> Value {
    serde_json::from_str(text.expect("entry present")).expect("entry is valid JSON")
}

fn assert_complete(results: &triage::TriageResults) {
    let keys: Vec<_> = results.iter().map(|(task, _)| task.as_str()).collect();
    assert_eq!(keys, ["classification", "resolution", "explanation"]);
}

#[tokio::test]
async fn happy_path_returns_every_entry_verbatim() {
    let client = ScriptedClient::happy().into_arc();
    let coordinator = TriageCoordinator::new(client.clone());

    let results = coordinator.process(SAMPLE_EXCEPTION).await;

    assert_complete(&results);
    assert_eq!(results.get(TaskName::Classification), Some(CLASSIFICATION_JSON));
    assert_eq!(results.get(TaskName::Resolution), Some(RESOLUTION_JSON));
    assert_eq!(results.get(TaskName::Explanation), Some(EXPLANATION_TEXT));
    assert_eq!(client.request_count(), 3);
}

#[tokio::test]
async fn classification_scenario_parses_to_model_object() {
    let coordinator = TriageCoordinator::new(ScriptedClient::happy().into_arc());

    let results = coordinator.process(SAMPLE_EXCEPTION).await;

    assert_eq!(
        parse(results.get(TaskName::Classification)),
        json!({"type": "Settlement Mismatch", "priority": "High", "complexity": "Medium"})
    );
}

#[tokio::test]
async fn every_agent_receives_the_raw_exception_by_default() {
    let client = ScriptedClient::happy().into_arc();
    let coordinator = TriageCoordinator::new(client.clone());

    coordinator.process(SAMPLE_EXCEPTION).await;

    for task in TaskName::ALL {
        let requests = client.requests_for(task);
        assert_eq!(requests.len(), 1, "{task}");
        assert!(requests[0].user_prompt().unwrap().contains(SAMPLE_EXCEPTION));
    }
}

#[tokio::test]
async fn non_json_resolution_becomes_format_fallback() {
    let client = ScriptedClient::happy()
        .with(TaskName::Resolution, Script::Reply("not json".into()))
        .into_arc();
    let coordinator = TriageCoordinator::new(client);

    let results = coordinator.process(SAMPLE_EXCEPTION).await;

    let resolution = parse(results.get(TaskName::Resolution));
    assert_eq!(resolution["suggestion"], "Error: Invalid response format");
    assert_eq!(resolution["confidence"], "0%");
    assert!(resolution["rationale"].is_string());
    assert_eq!(results.get(TaskName::Classification), Some(CLASSIFICATION_JSON));
}

#[tokio::test]
async fn explanation_network_failure_is_isolated() {
    let client = ScriptedClient::happy()
        .with(TaskName::Explanation, Script::Fail(network_error()))
        .into_arc();
    let coordinator = TriageCoordinator::new(client);

    let results = coordinator.process(SAMPLE_EXCEPTION).await;

    assert_complete(&results);
    let explanation = results.get(TaskName::Explanation).unwrap();
    assert!(explanation.starts_with("Error:"), "{explanation}");
    assert!(explanation.contains("connection refused"));
    assert_eq!(
        parse(results.get(TaskName::Classification)),
        parse(Some(CLASSIFICATION_JSON))
    );
    assert_eq!(
        parse(results.get(TaskName::Resolution)),
        parse(Some(RESOLUTION_JSON))
    );
}

#[tokio::test]
async fn classification_provider_failure_still_yields_json() {
    let client = ScriptedClient::happy()
        .with(
            TaskName::Classification,
            Script::Fail(CompletionError::RateLimited {
                message: "Rate limit reached for gpt-4".to_string(),
                retry_after: None,
            }),
        )
        .into_arc();
    let coordinator = TriageCoordinator::new(client);

    let results = coordinator.process(SAMPLE_EXCEPTION).await;

    let classification = parse(results.get(TaskName::Classification));
    assert_eq!(classification["type"], "Error: System error");
    assert!(classification["complexity"]
        .as_str()
        .unwrap()
        .contains("Rate limit reached"));
    assert_eq!(results.get(TaskName::Explanation), Some(EXPLANATION_TEXT));
}

#[tokio::test]
async fn every_agent_failing_still_returns_three_entries() {
    let client = ScriptedClient::new()
        .with(TaskName::Classification, Script::Fail(network_error()))
        .with(TaskName::Resolution, Script::Fail(network_error()))
        .with(TaskName::Explanation, Script::Fail(network_error()))
        .into_arc();
    let coordinator = TriageCoordinator::new(client);

    let results = coordinator.process(SAMPLE_EXCEPTION).await;

    assert_complete(&results);
    parse(results.get(TaskName::Classification));
    assert_eq!(
        parse(results.get(TaskName::Resolution))["confidence"],
        "0%"
    );
    assert!(results
        .get(TaskName::Explanation)
        .unwrap()
        .starts_with("Error:"));
}

#[tokio::test]
async fn panicking_agent_does_not_take_down_the_others() {
    let client = ScriptedClient::happy()
        .with(TaskName::Resolution, Script::Panic("stub exploded"))
        .into_arc();
    let coordinator = TriageCoordinator::new(client);

    let outcomes = coordinator
        .process_detailed(SAMPLE_EXCEPTION)
        .await
        .unwrap();

    assert!(matches!(
        outcomes.get(TaskName::Resolution),
        Some(Err(TaskError::Unexpected { .. }))
    ));
    assert_eq!(outcomes.failure_count(), 1);

    let results = outcomes.render();
    assert_eq!(
        parse(results.get(TaskName::Resolution))["suggestion"],
        "Error: System error"
    );
    assert_eq!(results.get(TaskName::Explanation), Some(EXPLANATION_TEXT));
}

#[tokio::test]
async fn empty_and_very_large_inputs_are_passed_through() {
    let client = ScriptedClient::happy().into_arc();
    let coordinator = TriageCoordinator::new(client.clone());

    assert_complete(&coordinator.process("").await);

    let large = "NAV break on fund 42. ".repeat(50_000);
    assert_complete(&coordinator.process(&large).await);
    let requests = client.requests_for(TaskName::Classification);
    assert!(requests[1].user_prompt().unwrap().contains(&large));
}

#[tokio::test]
async fn identical_inputs_give_identical_results() {
    let client = ScriptedClient::happy()
        .with(TaskName::Resolution, Script::Reply("{broken".into()))
        .with(TaskName::Explanation, Script::Fail(network_error()))
        .into_arc();
    let coordinator = TriageCoordinator::new(client);

    let first = coordinator.process(SAMPLE_EXCEPTION).await;
    let second = coordinator.process(SAMPLE_EXCEPTION).await;

    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 3)]
async fn works_on_a_multi_threaded_runtime() {
    let coordinator = TriageCoordinator::new(ScriptedClient::happy().into_arc());

    let results = coordinator.process(SAMPLE_EXCEPTION).await;

    assert_complete(&results);
}

#[tokio::test]
async fn dropping_an_invocation_aborts_its_workers() {
    let dropped = Arc::new(AtomicBool::new(false));
    let client = ScriptedClient::happy()
        .with(TaskName::Resolution, Script::Hang(Arc::clone(&dropped)))
        .into_arc();
    let coordinator = TriageCoordinator::new(client.clone());

    let timed_out = tokio::time::timeout(
        Duration::from_millis(50),
        coordinator.process(SAMPLE_EXCEPTION),
    )
    .await;
    assert!(timed_out.is_err());
    assert_eq!(client.requests_for(TaskName::Resolution).len(), 1);

    for _ in 0..200 {
        if dropped.load(Ordering::SeqCst) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(dropped.load(Ordering::SeqCst), "hung worker was not aborted");
}

// ---------------------------------------------------------------------------
// Chained explanation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn chained_explanation_explains_the_resolution() {
    let client = ScriptedClient::happy().into_arc();
    let coordinator = TriageCoordinator::new(client.clone())
        .with_explanation_source(ExplanationSource::Resolution);

    let results = coordinator.process(SAMPLE_EXCEPTION).await;

    assert_complete(&results);
    let explanation_requests = client.requests_for(TaskName::Explanation);
    assert_eq!(explanation_requests.len(), 1);
    let prompt = explanation_requests[0].user_prompt().unwrap();
    assert!(prompt.contains(RESOLUTION_JSON));
    assert!(!prompt.contains(SAMPLE_EXCEPTION));
}

#[tokio::test]
async fn chained_explanation_fails_when_resolution_is_malformed() {
    let client = ScriptedClient::happy()
        .with(TaskName::Resolution, Script::Reply("not json".into()))
        .into_arc();
    let coordinator = TriageCoordinator::new(client.clone())
        .with_explanation_source(ExplanationSource::Resolution);

    let outcomes = coordinator
        .process_detailed(SAMPLE_EXCEPTION)
        .await
        .unwrap();

    assert!(matches!(
        outcomes.get(TaskName::Explanation),
        Some(Err(TaskError::Unexpected { detail }))
            if detail.starts_with("resolution suggestion unavailable")
    ));
    assert!(client.requests_for(TaskName::Explanation).is_empty());

    let results = outcomes.render();
    assert!(results
        .get(TaskName::Explanation)
        .unwrap()
        .starts_with("Error: resolution suggestion unavailable"));
}

#[tokio::test]
async fn chained_explanation_survives_a_panicking_resolution() {
    let client = ScriptedClient::happy()
        .with(TaskName::Resolution, Script::Panic("stub exploded"))
        .into_arc();
    let coordinator = TriageCoordinator::new(client)
        .with_explanation_source(ExplanationSource::Resolution);

    let results = coordinator.process(SAMPLE_EXCEPTION).await;

    assert_complete(&results);
    assert_eq!(
        results.get(TaskName::Explanation),
        Some("Error: resolution agent ended without a result")
    );
    assert_eq!(results.get(TaskName::Classification), Some(CLASSIFICATION_JSON));
}

// ---------------------------------------------------------------------------
// No runtime
// ---------------------------------------------------------------------------

struct NoopWake;

impl Wake for NoopWake {
    fn wake(self: Arc<Self>) {}
}

fn poll_once<F: Future>(future: F) -> Poll<F::Output> {
    let waker = Waker::from(Arc::new(NoopWake));
    let mut cx = Context::from_waker(&waker);
    let mut future = pin!(future);
    future.as_mut().poll(&mut cx)
}

#[test]
fn without_a_runtime_process_returns_the_empty_sentinel() {
    let client = ScriptedClient::happy().into_arc();
    let coordinator = TriageCoordinator::new(client.clone());

    match poll_once(coordinator.process(SAMPLE_EXCEPTION)) {
        Poll::Ready(results) => assert!(results.is_empty()),
        Poll::Pending => panic!("expected an immediate result"),
    }
    match poll_once(coordinator.process_detailed(SAMPLE_EXCEPTION)) {
        Poll::Ready(outcome) => assert_eq!(outcome, Err(TriageError::RuntimeUnavailable)),
        Poll::Pending => panic!("expected an immediate result"),
    }
    assert_eq!(client.request_count(), 0);
}
