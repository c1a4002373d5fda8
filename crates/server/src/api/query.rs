//! Query relay endpoint.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::state::AppState;

/// Invocation event shape, for documentation purposes only.
///
/// The handler accepts the raw event so both observed forms work: a flat
/// `query` string, or a `body` envelope holding a JSON-encoded object
/// with a `query` field.
#[derive(Deserialize, utoipa::ToSchema)]
#[allow(dead_code)]
pub struct QueryEvent {
    pub query: Option<String>,
    pub body: Option<String>,
}

/// Relay a SQL query to Athena
///
/// Submits the query, blocks until the execution reaches a terminal state,
/// and maps the relay's normalized response onto HTTP: its status code
/// becomes the HTTP status, its body the response body.
#[utoipa::path(
    post,
    path = "/query",
    tag = "Query",
    request_body = QueryEvent,
    responses(
        (status = 200, description = "Serialized query results", content_type = "application/json"),
        (status = 400, description = "Missing or malformed query"),
        (status = 500, description = "Execution failure or internal error")
    )
)]
pub async fn query(State(state): State<Arc<AppState>>, Json(event): Json<Value>) -> Response {
    let relayed = state.relay.handle(&event).await;

    let status =
        StatusCode::from_u16(relayed.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let content_type = if relayed.status_code == 200 {
        "application/json"
    } else {
        "text/plain; charset=utf-8"
    };

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(relayed.body))
        .unwrap()
}
