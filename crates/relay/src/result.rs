use std::fmt;

use serde::{Deserialize, Serialize};

/// Column definition from an executed query's result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultColumn {
    /// Column name as declared in the result set.
    pub name: String,
    /// Athena data type (e.g. "varchar", "bigint", "double", "boolean").
    pub data_type: String,
}

/// Execution metadata attached to a fetched result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSummary {
    /// Athena query execution ID.
    pub query_id: String,
    /// Final execution state as reported by the service.
    pub state: String,
    /// Total bytes scanned during execution.
    pub bytes_scanned: u64,
    /// Engine execution time in milliseconds.
    pub execution_time_ms: u64,
    /// S3 location where the service persisted the result artifact, if known.
    pub output_location: Option<String>,
}

/// Structured result set returned by the relay on success.
///
/// Rows are `Vec<Option<String>>` where `None` is SQL NULL; each row has
/// the same length and ordering as `columns`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResults {
    pub columns: Vec<ResultColumn>,
    pub rows: Vec<Vec<Option<String>>>,
    pub summary: ExecutionSummary,
}

impl QueryResults {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Zero-based index of a column by name (case-sensitive).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Value at the given row index and column name.
    ///
    /// `None` for out-of-bounds rows, unknown columns, and SQL NULL cells.
    pub fn get_value(&self, row: usize, col: &str) -> Option<&str> {
        let idx = self.column_index(col)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }
}

impl fmt::Display for QueryResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            return write!(f, "(empty result set)");
        }

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.name.len()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.as_deref().unwrap_or("NULL").len());
                }
            }
        }

        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{:<width$}", col.name, width = widths[i])?;
        }
        writeln!(f)?;

        for (i, w) in widths.iter().enumerate() {
            if i > 0 {
                write!(f, "-+-")?;
            }
            write!(f, "{}", "-".repeat(*w))?;
        }
        writeln!(f)?;

        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, " | ")?;
                }
                write!(f, "{:<width$}", cell.as_deref().unwrap_or("NULL"), width = widths[i])?;
            }
            writeln!(f)?;
        }

        writeln!(f)?;
        write!(
            f,
            "Query {} | {} | {} rows | {:.3} MB scanned | {}ms",
            self.summary.query_id,
            self.summary.state,
            self.rows.len(),
            self.summary.bytes_scanned as f64 / (1024.0 * 1024.0),
            self.summary.execution_time_ms,
        )
    }
}
