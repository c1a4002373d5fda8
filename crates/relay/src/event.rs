//! Invocation event parsing.
//!
//! Two event shapes reach the relay: a top-level `query` string, and an
//! API-gateway style envelope whose `body` field carries a JSON-encoded
//! object with a `query` field. Parsing failures here short-circuit the
//! invocation before any external call is made.

use serde_json::Value;

use crate::error::EventError;

/// Extract the SQL query string from an invocation event.
///
/// A non-empty top-level `query` string is authoritative. Otherwise the
/// `body` envelope is consulted: a JSON-encoded string is decoded first,
/// and a body that already arrives as a JSON object is accepted as-is.
pub fn extract_query(event: &Value) -> Result<String, EventError> {
    if let Some(sql) = event.get("query").and_then(Value::as_str) {
        if !sql.trim().is_empty() {
            return Ok(sql.to_string());
        }
    }

    if let Some(body) = event.get("body") {
        let inner: Value = match body {
            Value::String(raw) => serde_json::from_str(raw)
                .map_err(|e| EventError::InvalidEnvelope(e.to_string()))?,
            Value::Object(_) => body.clone(),
            other => {
                return Err(EventError::InvalidEnvelope(format!(
                    "body must be a JSON object or string, got {other}"
                )))
            }
        };

        if let Some(sql) = inner.get("query").and_then(Value::as_str) {
            if !sql.trim().is_empty() {
                return Ok(sql.to_string());
            }
        }
    }

    Err(EventError::MissingQuery)
}
