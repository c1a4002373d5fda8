use thiserror::Error;

/// Errors from the relay pipeline, one variant per stage.
///
/// None of these are retried: every variant is terminal for the invocation
/// and is surfaced to the caller as a server-error response.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Required configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Athena rejected the query submission.
    #[error("failed to submit query: {0}")]
    Submit(String),

    /// A status poll could not reach Athena.
    #[error("failed to check query status: {0}")]
    StatusCheck(String),

    /// The execution reached the FAILED terminal state.
    #[error("query {query_id} finished with status FAILED: {reason}")]
    QueryFailed { query_id: String, reason: String },

    /// The execution was cancelled (by the user or by Athena).
    #[error("query {query_id} finished with status CANCELLED")]
    QueryCancelled { query_id: String },

    /// The poll attempt budget ran out before a terminal state was seen.
    #[error("query {query_id} still not terminal after {attempts} status checks")]
    PollTimeout { query_id: String, attempts: u32 },

    /// Results could not be retrieved after a successful execution.
    #[error("failed to fetch query results: {0}")]
    FetchResults(String),
}

/// Client-input errors detected before any external call is made.
///
/// These map to 400 responses; [`RelayError`] maps to 500.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    /// The event carries no usable SQL query in either accepted shape.
    #[error("no SQL query was provided in the request")]
    MissingQuery,

    /// The `body` envelope exists but does not decode to JSON.
    #[error("request body is not valid JSON: {0}")]
    InvalidEnvelope(String),
}
