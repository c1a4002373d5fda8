//! The query execution seam.
//!
//! [`QueryExecutor`] abstracts the three calls the relay makes against the
//! external service (submit, status, fetch), so the relay can be driven by
//! a fake in tests. [`AthenaExecutor`] is the production implementation
//! over the AWS SDK.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_athena::types::QueryExecutionState;
use tracing::{debug, info};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::result::{ExecutionSummary, QueryResults, ResultColumn};

/// Execution state reported by the query service.
///
/// `Queued` and `Running` are the non-terminal states; everything else
/// ends the polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Queued,
    Running,
    Succeeded,
    Failed { reason: String },
    Cancelled,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionStatus::Queued | ExecutionStatus::Running)
    }
}

/// The three operations the relay consumes from the external service.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Submit a query for execution; returns the execution ID.
    async fn submit(
        &self,
        sql: &str,
        database: &str,
        output_location: &str,
    ) -> Result<String, RelayError>;

    /// Current execution state for a submitted query.
    async fn status(&self, query_id: &str) -> Result<ExecutionStatus, RelayError>;

    /// Full result set of a successfully completed query.
    async fn fetch_results(&self, query_id: &str) -> Result<QueryResults, RelayError>;
}

// ── AthenaExecutor ───────────────────────────────────────────────

/// [`QueryExecutor`] backed by AWS Athena.
pub struct AthenaExecutor {
    client: aws_sdk_athena::Client,
    workgroup: String,
}

impl AthenaExecutor {
    /// Build an executor from the given configuration.
    ///
    /// Credentials come from the default AWS provider chain.
    pub async fn new(config: &RelayConfig) -> Self {
        let region = aws_sdk_athena::config::Region::new(config.region.clone());
        let aws_cfg = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;

        info!(
            region = %config.region,
            database = %config.database,
            workgroup = %config.workgroup,
            "Athena executor initialised"
        );

        Self {
            client: aws_sdk_athena::Client::new(&aws_cfg),
            workgroup: config.workgroup.clone(),
        }
    }
}

#[async_trait]
impl QueryExecutor for AthenaExecutor {
    async fn submit(
        &self,
        sql: &str,
        database: &str,
        output_location: &str,
    ) -> Result<String, RelayError> {
        let resp = self
            .client
            .start_query_execution()
            .query_string(sql)
            .query_execution_context({
                let mut ctx = aws_sdk_athena::types::QueryExecutionContext::builder();
                if !database.is_empty() {
                    ctx = ctx.database(database);
                }
                ctx.build()
            })
            .result_configuration(
                aws_sdk_athena::types::ResultConfiguration::builder()
                    .output_location(output_location)
                    .build(),
            )
            .work_group(&self.workgroup)
            .send()
            .await
            .map_err(|e| RelayError::Submit(e.to_string()))?;

        resp.query_execution_id()
            .map(str::to_string)
            .ok_or_else(|| RelayError::Submit("no query execution ID returned".into()))
    }

    async fn status(&self, query_id: &str) -> Result<ExecutionStatus, RelayError> {
        let resp = self
            .client
            .get_query_execution()
            .query_execution_id(query_id)
            .send()
            .await
            .map_err(|e| RelayError::StatusCheck(e.to_string()))?;

        let execution = resp
            .query_execution()
            .ok_or_else(|| RelayError::StatusCheck("no query execution in response".into()))?;

        let state = execution
            .status()
            .and_then(|s| s.state())
            .cloned()
            .unwrap_or(QueryExecutionState::Queued);

        Ok(match state {
            QueryExecutionState::Succeeded => ExecutionStatus::Succeeded,
            QueryExecutionState::Failed => ExecutionStatus::Failed {
                reason: execution
                    .status()
                    .and_then(|s| s.state_change_reason())
                    .unwrap_or("unknown")
                    .to_string(),
            },
            QueryExecutionState::Cancelled => ExecutionStatus::Cancelled,
            QueryExecutionState::Running => ExecutionStatus::Running,
            // QUEUED or any future variant
            _ => ExecutionStatus::Queued,
        })
    }

    async fn fetch_results(&self, query_id: &str) -> Result<QueryResults, RelayError> {
        // Stats come from the execution record, rows from the results API.
        let exec_resp = self
            .client
            .get_query_execution()
            .query_execution_id(query_id)
            .send()
            .await
            .map_err(|e| RelayError::FetchResults(e.to_string()))?;

        let execution = exec_resp.query_execution();
        let stats = execution.and_then(|q| q.statistics());
        let summary = ExecutionSummary {
            query_id: query_id.to_string(),
            state: execution
                .and_then(|q| q.status())
                .and_then(|s| s.state())
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            bytes_scanned: stats.and_then(|s| s.data_scanned_in_bytes()).unwrap_or(0) as u64,
            execution_time_ms: stats
                .and_then(|s| s.engine_execution_time_in_millis())
                .unwrap_or(0) as u64,
            output_location: execution
                .and_then(|q| q.result_configuration())
                .and_then(|rc| rc.output_location())
                .map(str::to_string),
        };

        let mut columns: Vec<ResultColumn> = Vec::new();
        let mut rows: Vec<Vec<Option<String>>> = Vec::new();
        let mut next_token: Option<String> = None;
        let mut first_page = true;

        loop {
            let mut request = self
                .client
                .get_query_results()
                .query_execution_id(query_id)
                .max_results(1000);
            if let Some(ref token) = next_token {
                request = request.next_token(token);
            }

            let resp = request
                .send()
                .await
                .map_err(|e| RelayError::FetchResults(e.to_string()))?;

            if let Some(result_set) = resp.result_set() {
                if columns.is_empty() {
                    if let Some(meta) = result_set.result_set_metadata() {
                        columns = meta
                            .column_info()
                            .iter()
                            .map(|ci| ResultColumn {
                                name: ci.name().to_string(),
                                data_type: ci.r#type().to_string(),
                            })
                            .collect();
                    }
                }

                // For SELECTs the first row of the first page echoes the
                // column headers and must be skipped.
                let skip = if first_page && resp.update_count().is_none() {
                    1
                } else {
                    0
                };
                for row in result_set.rows().iter().skip(skip) {
                    rows.push(
                        row.data()
                            .iter()
                            .map(|d| d.var_char_value().map(str::to_string))
                            .collect(),
                    );
                }
            }

            first_page = false;
            next_token = resp.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        debug!(
            query_id = %query_id,
            columns = columns.len(),
            rows = rows.len(),
            "fetched query results"
        );

        Ok(QueryResults { columns, rows, summary })
    }
}
