//! Scripted executor for driving the relay without AWS.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use query_relay::{
    ExecutionStatus, ExecutionSummary, QueryExecutor, QueryResults, RelayError, ResultColumn,
};

/// Shared call counters, cloneable so tests can keep a handle after the
/// executor is boxed into the relay.
#[derive(Clone, Default)]
pub struct CallLog {
    pub submits: Arc<AtomicUsize>,
    pub status_checks: Arc<AtomicUsize>,
    pub fetches: Arc<AtomicUsize>,
}

impl CallLog {
    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn status_checks(&self) -> usize {
        self.status_checks.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

/// A deterministic [`QueryExecutor`] driven by a prepared script.
///
/// Status values are consumed in order; the last one repeats once the
/// script is exhausted (so a single `Running` entry models a query that
/// never finishes).
pub struct ScriptedExecutor {
    submit: Result<String, String>,
    statuses: Vec<ExecutionStatus>,
    status_error: Option<String>,
    status_cursor: AtomicUsize,
    results: Result<QueryResults, String>,
    log: CallLog,
}

pub fn sample_results() -> QueryResults {
    QueryResults {
        columns: vec![ResultColumn { name: "value".into(), data_type: "varchar".into() }],
        rows: vec![vec![Some("mock-payload".into())]],
        summary: ExecutionSummary {
            query_id: "exec-0001".into(),
            state: "SUCCEEDED".into(),
            bytes_scanned: 1024,
            execution_time_ms: 12,
            output_location: Some("s3://bucket/results/exec-0001.csv".into()),
        },
    }
}

impl ScriptedExecutor {
    pub fn new(statuses: Vec<ExecutionStatus>) -> Self {
        Self {
            submit: Ok("exec-0001".into()),
            statuses,
            status_error: None,
            status_cursor: AtomicUsize::new(0),
            results: Ok(sample_results()),
            log: CallLog::default(),
        }
    }

    pub fn with_submit_error(message: &str) -> Self {
        let mut exec = Self::new(vec![]);
        exec.submit = Err(message.to_string());
        exec
    }

    pub fn with_status_error(message: &str) -> Self {
        let mut exec = Self::new(vec![]);
        exec.status_error = Some(message.to_string());
        exec
    }

    pub fn with_fetch_error(statuses: Vec<ExecutionStatus>, message: &str) -> Self {
        let mut exec = Self::new(statuses);
        exec.results = Err(message.to_string());
        exec
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

#[async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn submit(
        &self,
        _sql: &str,
        _database: &str,
        _output_location: &str,
    ) -> Result<String, RelayError> {
        self.log.submits.fetch_add(1, Ordering::SeqCst);
        self.submit.clone().map_err(RelayError::Submit)
    }

    async fn status(&self, _query_id: &str) -> Result<ExecutionStatus, RelayError> {
        self.log.status_checks.fetch_add(1, Ordering::SeqCst);
        let idx = self.status_cursor.fetch_add(1, Ordering::SeqCst);
        if idx >= self.statuses.len() {
            if let Some(ref message) = self.status_error {
                return Err(RelayError::StatusCheck(message.clone()));
            }
        }
        self.statuses
            .get(idx)
            .or_else(|| self.statuses.last())
            .cloned()
            .ok_or_else(|| RelayError::StatusCheck("no scripted status".into()))
    }

    async fn fetch_results(&self, _query_id: &str) -> Result<QueryResults, RelayError> {
        self.log.fetches.fetch_add(1, Ordering::SeqCst);
        self.results.clone().map_err(RelayError::FetchResults)
    }
}
