//! Event-shape handling across the two accepted input forms.

use query_relay::{extract_query, EventError};
use serde_json::json;

#[test]
fn both_shapes_resolve_to_the_same_query() {
    let flat = json!({ "query": "SELECT count(*) FROM events" });
    let enveloped = json!({ "body": "{\"query\": \"SELECT count(*) FROM events\"}" });

    assert_eq!(
        extract_query(&flat).unwrap(),
        extract_query(&enveloped).unwrap()
    );
}

#[test]
fn flat_form_is_authoritative() {
    let event = json!({
        "query": "SELECT 'a'",
        "body": "{\"query\": \"SELECT 'b'\"}"
    });
    assert_eq!(extract_query(&event).unwrap(), "SELECT 'a'");
}

#[test]
fn unusable_flat_query_falls_back_to_the_envelope() {
    let event = json!({
        "query": "",
        "body": "{\"query\": \"SELECT 'b'\"}"
    });
    assert_eq!(extract_query(&event).unwrap(), "SELECT 'b'");
}

#[test]
fn error_classification() {
    assert_eq!(extract_query(&json!({})), Err(EventError::MissingQuery));
    assert!(matches!(
        extract_query(&json!({ "body": "]" })),
        Err(EventError::InvalidEnvelope(_))
    ));
    assert!(matches!(
        extract_query(&json!({ "body": [1, 2] })),
        Err(EventError::InvalidEnvelope(_))
    ));
}
