//! The query relay: validate, submit, poll, fetch, respond.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::event::extract_query;
use crate::executor::{ExecutionStatus, QueryExecutor};
use crate::result::QueryResults;

/// Normalized invocation response: a status code plus a string body.
///
/// On success the body is the JSON-serialized [`QueryResults`]; on error
/// it is a plain human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl RelayResponse {
    pub fn ok(body: String) -> Self {
        Self { status_code: 200, body }
    }

    pub fn client_error(message: impl Into<String>) -> Self {
        Self { status_code: 400, body: message.into() }
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self { status_code: 500, body: message.into() }
    }
}

/// Relays one query request to the external execution service.
///
/// The executor is an explicit dependency so tests can substitute a
/// scripted fake for the AWS-backed implementation.
pub struct QueryRelay {
    executor: Box<dyn QueryExecutor>,
    config: RelayConfig,
}

impl QueryRelay {
    pub fn new(executor: Box<dyn QueryExecutor>, config: RelayConfig) -> Self {
        Self { executor, config }
    }

    /// Handle one invocation event end to end.
    ///
    /// Never returns an error: every failure mode is folded into the
    /// response. Client-input problems become 400s without touching the
    /// external service; everything downstream becomes a 500.
    pub async fn handle(&self, event: &Value) -> RelayResponse {
        info!(event = %event, "received query event");

        let sql = match extract_query(event) {
            Ok(sql) => sql,
            Err(e) => {
                warn!(error = %e, "rejecting event without submission");
                return RelayResponse::client_error(e.to_string());
            }
        };

        match self.execute(&sql).await {
            Ok(results) => match serde_json::to_string(&results) {
                Ok(body) => RelayResponse::ok(body),
                Err(e) => {
                    error!(error = %e, "result serialization failed");
                    RelayResponse::server_error(format!("failed to serialize results: {e}"))
                }
            },
            Err(e) => {
                error!(error = %e, "query relay failed");
                RelayResponse::server_error(e.to_string())
            }
        }
    }

    /// Run a query through the full lifecycle and return the parsed results.
    pub async fn execute(&self, sql: &str) -> Result<QueryResults, RelayError> {
        let query_id = self
            .executor
            .submit(sql, &self.config.database, &self.config.output_location)
            .await?;
        info!(query_id = %query_id, "query submitted");

        self.poll_until_succeeded(&query_id).await?;
        self.executor.fetch_results(&query_id).await
    }

    /// Poll status at the configured interval until SUCCEEDED.
    ///
    /// FAILED and CANCELLED terminate with the matching error; exhausting
    /// the attempt budget yields [`RelayError::PollTimeout`].
    async fn poll_until_succeeded(&self, query_id: &str) -> Result<(), RelayError> {
        let interval = Duration::from_millis(self.config.poll_interval_ms);

        for attempt in 1..=self.config.max_poll_attempts {
            let status = self.executor.status(query_id).await?;
            debug!(query_id = %query_id, status = ?status, attempt, "status check");

            match status {
                ExecutionStatus::Succeeded => return Ok(()),
                ExecutionStatus::Failed { reason } => {
                    return Err(RelayError::QueryFailed {
                        query_id: query_id.to_string(),
                        reason,
                    })
                }
                ExecutionStatus::Cancelled => {
                    return Err(RelayError::QueryCancelled {
                        query_id: query_id.to_string(),
                    })
                }
                ExecutionStatus::Queued | ExecutionStatus::Running => {
                    if attempt < self.config.max_poll_attempts {
                        tokio::time::sleep(interval).await;
                    }
                }
            }
        }

        warn!(
            query_id = %query_id,
            attempts = self.config.max_poll_attempts,
            "poll budget exhausted"
        );
        Err(RelayError::PollTimeout {
            query_id: query_id.to_string(),
            attempts: self.config.max_poll_attempts,
        })
    }
}
