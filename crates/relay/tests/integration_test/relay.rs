//! End-to-end relay behavior against the scripted executor.

use serde_json::json;

use query_relay::{ExecutionStatus, QueryRelay, RelayConfig};

use crate::mock::{CallLog, ScriptedExecutor};

fn test_config() -> RelayConfig {
    RelayConfig {
        database: "analytics".into(),
        output_location: "s3://bucket/results/".into(),
        region: "us-east-1".into(),
        workgroup: "primary".into(),
        poll_interval_ms: 0,
        max_poll_attempts: 5,
    }
}

fn relay_with(executor: ScriptedExecutor) -> (QueryRelay, CallLog) {
    let log = executor.log();
    (QueryRelay::new(Box::new(executor), test_config()), log)
}

#[tokio::test]
async fn missing_query_is_400_and_never_submits() {
    let (relay, log) = relay_with(ScriptedExecutor::new(vec![ExecutionStatus::Succeeded]));

    let response = relay.handle(&json!({})).await;
    assert_eq!(response.status_code, 400);
    assert!(response.body.contains("no SQL query"));
    assert_eq!(log.submits(), 0);

    let response = relay.handle(&json!({ "body": "{\"other\": 1}" })).await;
    assert_eq!(response.status_code, 400);
    assert_eq!(log.submits(), 0);
}

#[tokio::test]
async fn malformed_envelope_is_400_and_never_submits() {
    let (relay, log) = relay_with(ScriptedExecutor::new(vec![ExecutionStatus::Succeeded]));

    let response = relay.handle(&json!({ "body": "{not json" })).await;
    assert_eq!(response.status_code, 400);
    assert!(response.body.contains("not valid JSON"));
    assert_eq!(log.submits(), 0);
    assert_eq!(log.status_checks(), 0);
}

#[tokio::test]
async fn successful_query_returns_200_with_payload() {
    let (relay, log) = relay_with(ScriptedExecutor::new(vec![ExecutionStatus::Succeeded]));

    let response = relay.handle(&json!({ "query": "SELECT 1" })).await;
    assert_eq!(response.status_code, 200);
    assert!(response.body.contains("mock-payload"));
    assert!(response.body.contains("exec-0001"));
    assert_eq!(log.submits(), 1);
    assert_eq!(log.status_checks(), 1);
    assert_eq!(log.fetches(), 1);
}

#[tokio::test]
async fn enveloped_query_reaches_the_executor() {
    let (relay, log) = relay_with(ScriptedExecutor::new(vec![
        ExecutionStatus::Queued,
        ExecutionStatus::Running,
        ExecutionStatus::Succeeded,
    ]));

    let event = json!({ "body": "{\"query\": \"SELECT 1\"}" });
    let response = relay.handle(&event).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(log.submits(), 1);
    assert_eq!(log.status_checks(), 3);
}

#[tokio::test]
async fn failed_query_is_500_naming_the_status() {
    let (relay, log) = relay_with(ScriptedExecutor::new(vec![
        ExecutionStatus::Running,
        ExecutionStatus::Failed { reason: "SYNTAX_ERROR: line 1:8".into() },
    ]));

    let response = relay.handle(&json!({ "query": "SELEKT 1" })).await;
    assert_eq!(response.status_code, 500);
    assert!(response.body.contains("FAILED"));
    assert!(response.body.contains("SYNTAX_ERROR"));
    assert_eq!(log.fetches(), 0);
}

#[tokio::test]
async fn cancelled_query_is_500_naming_the_status() {
    let (relay, log) = relay_with(ScriptedExecutor::new(vec![ExecutionStatus::Cancelled]));

    let response = relay.handle(&json!({ "query": "SELECT 1" })).await;
    assert_eq!(response.status_code, 500);
    assert!(response.body.contains("CANCELLED"));
    assert_eq!(log.fetches(), 0);
}

#[tokio::test]
async fn submit_error_is_500_and_never_polls() {
    let (relay, log) = relay_with(ScriptedExecutor::with_submit_error("AccessDeniedException"));

    let response = relay.handle(&json!({ "query": "SELECT 1" })).await;
    assert_eq!(response.status_code, 500);
    assert!(response.body.contains("AccessDeniedException"));
    assert_eq!(log.submits(), 1);
    assert_eq!(log.status_checks(), 0);
    assert_eq!(log.fetches(), 0);
}

#[tokio::test]
async fn status_error_is_500() {
    let (relay, log) = relay_with(ScriptedExecutor::with_status_error("connection reset"));

    let response = relay.handle(&json!({ "query": "SELECT 1" })).await;
    assert_eq!(response.status_code, 500);
    assert!(response.body.contains("connection reset"));
    assert_eq!(log.fetches(), 0);
}

#[tokio::test]
async fn fetch_error_is_500() {
    let (relay, _log) = relay_with(ScriptedExecutor::with_fetch_error(
        vec![ExecutionStatus::Succeeded],
        "throttled",
    ));

    let response = relay.handle(&json!({ "query": "SELECT 1" })).await;
    assert_eq!(response.status_code, 500);
    assert!(response.body.contains("throttled"));
}

#[tokio::test]
async fn poll_budget_exhaustion_is_a_distinct_500() {
    // A single Running status repeats forever; the relay must give up
    // after exactly max_poll_attempts checks.
    let (relay, log) = relay_with(ScriptedExecutor::new(vec![ExecutionStatus::Running]));

    let response = relay.handle(&json!({ "query": "SELECT 1" })).await;
    assert_eq!(response.status_code, 500);
    assert!(response.body.contains("5 status checks"));
    assert_eq!(log.status_checks(), 5);
    assert_eq!(log.fetches(), 0);
}

#[tokio::test]
async fn identical_inputs_yield_identical_status_codes() {
    let (relay, _log) = relay_with(ScriptedExecutor::new(vec![ExecutionStatus::Succeeded]));
    let event = json!({ "query": "SELECT 1" });

    let first = relay.handle(&event).await;
    let second = relay.handle(&event).await;
    assert_eq!(first.status_code, second.status_code);
    assert_eq!(first.status_code, 200);

    let (relay, _log) = relay_with(ScriptedExecutor::with_submit_error("boom"));
    let first = relay.handle(&event).await;
    let second = relay.handle(&event).await;
    assert_eq!(first.status_code, second.status_code);
    assert_eq!(first.status_code, 500);
}
