//! Parquet export and inspection for query results.
//!
//! Maps Athena SQL types to Arrow types and writes typed, Zstd-compressed
//! Parquet files with execution metadata in the footer. Also covers the
//! reverse direction: converting ad-hoc JSON record sets into a result set
//! for dumping, and summarizing an existing Parquet file (schema + head).

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder,
    TimestampMillisecondBuilder,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde_json::Value;
use tracing::debug;

use crate::result::{ExecutionSummary, QueryResults, ResultColumn};

// ── Error ────────────────────────────────────────────────────────

/// Errors from Parquet conversion, writing, or reading.
#[derive(Debug, thiserror::Error)]
pub enum ParquetError {
    #[error("Arrow conversion error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input records could not be mapped onto a tabular shape.
    #[error("record conversion error: {0}")]
    Convert(String),
}

// ── Type mapping ─────────────────────────────────────────────────

/// Map an Athena SQL type string to an Arrow type.
///
/// Anything outside the integer/float/boolean/timestamp families (dates,
/// strings, arrays, maps, structs) is kept as UTF-8.
fn sql_type_to_arrow(sql_type: &str) -> DataType {
    match sql_type.to_lowercase().as_str() {
        "tinyint" | "smallint" | "int" | "integer" | "bigint" => DataType::Int64,
        "float" | "real" | "double" | "decimal" => DataType::Float64,
        "boolean" => DataType::Boolean,
        "timestamp" | "timestamp with time zone" => {
            DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into()))
        }
        _ => DataType::Utf8,
    }
}

fn build_schema(columns: &[ResultColumn]) -> Schema {
    let fields: Vec<Field> = columns
        .iter()
        .map(|col| Field::new(&col.name, sql_type_to_arrow(&col.data_type), true))
        .collect();
    Schema::new(fields)
}

// ── Column builders ──────────────────────────────────────────────

/// Build one typed Arrow array from the string cells of a single column.
///
/// Cells that fail to parse into the target type become NULL.
fn build_column(
    data_type: &DataType,
    rows: &[Vec<Option<String>>],
    col_idx: usize,
) -> ArrayRef {
    let cell = |row: &Vec<Option<String>>| row.get(col_idx).and_then(|v| v.as_deref().map(str::to_string));

    match data_type {
        DataType::Int64 => {
            let mut builder = Int64Builder::with_capacity(rows.len());
            for row in rows {
                builder.append_option(cell(row).and_then(|s| s.parse::<i64>().ok()));
            }
            Arc::new(builder.finish())
        }
        DataType::Float64 => {
            let mut builder = Float64Builder::with_capacity(rows.len());
            for row in rows {
                builder.append_option(cell(row).and_then(|s| s.parse::<f64>().ok()));
            }
            Arc::new(builder.finish())
        }
        DataType::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(rows.len());
            for row in rows {
                builder.append_option(cell(row).and_then(|s| match s.to_lowercase().as_str() {
                    "true" | "1" => Some(true),
                    "false" | "0" => Some(false),
                    _ => None,
                }));
            }
            Arc::new(builder.finish())
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            let mut builder = TimestampMillisecondBuilder::with_capacity(rows.len());
            for row in rows {
                builder.append_option(cell(row).and_then(|s| parse_timestamp_ms(&s)));
            }
            Arc::new(builder.finish().with_timezone("UTC"))
        }
        _ => {
            let mut builder = StringBuilder::with_capacity(rows.len(), rows.len() * 32);
            for row in rows {
                builder.append_option(cell(row));
            }
            Arc::new(builder.finish())
        }
    }
}

/// Parse a timestamp string into epoch milliseconds.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (with optional fractional
/// seconds), and bare dates (midnight UTC).
fn parse_timestamp_ms(value: &str) -> Option<i64> {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).timestamp_millis());
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(ndt.and_utc().timestamp_millis());
    }
    if let Ok(nd) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(nd.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }
    None
}

// ── Writing ──────────────────────────────────────────────────────

/// Convert a result set into an Arrow [`RecordBatch`].
pub fn results_to_record_batch(results: &QueryResults) -> Result<RecordBatch, ParquetError> {
    let schema = Arc::new(build_schema(&results.columns));
    let arrays: Vec<ArrayRef> = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(idx, field)| build_column(field.data_type(), &results.rows, idx))
        .collect();
    Ok(RecordBatch::try_new(schema, arrays)?)
}

fn footer_metadata(summary: &ExecutionSummary) -> Vec<parquet::format::KeyValue> {
    vec![
        parquet::format::KeyValue::new(
            "relay.query_id".to_string(),
            Some(summary.query_id.clone()),
        ),
        parquet::format::KeyValue::new("relay.state".to_string(), Some(summary.state.clone())),
        parquet::format::KeyValue::new(
            "relay.bytes_scanned".to_string(),
            Some(summary.bytes_scanned.to_string()),
        ),
        parquet::format::KeyValue::new(
            "relay.execution_time_ms".to_string(),
            Some(summary.execution_time_ms.to_string()),
        ),
    ]
}

/// Write a result set to a Parquet file at the given path.
///
/// Uses Zstd compression and stores the execution summary as key-value
/// metadata in the file footer. Returns the number of rows written.
pub fn write_parquet(results: &QueryResults, path: &Path) -> Result<u64, ParquetError> {
    let batch = results_to_record_batch(results)?;
    let row_count = batch.num_rows() as u64;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(Default::default()))
        .set_key_value_metadata(Some(footer_metadata(&results.summary)))
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    debug!(
        path = %path.display(),
        rows = row_count,
        query_id = %results.summary.query_id,
        "wrote Parquet file"
    );

    Ok(row_count)
}

// ── JSON record conversion ───────────────────────────────────────

/// Convert a JSON array of flat objects into a [`QueryResults`].
///
/// Columns are the union of keys in first-seen order; types are inferred
/// per column (bigint / double / boolean / varchar, widening bigint to
/// double and anything mixed to varchar). `source` labels the synthetic
/// execution summary.
pub fn records_to_results(records: &[Value], source: &str) -> Result<QueryResults, ParquetError> {
    let mut names: Vec<String> = Vec::new();
    for record in records {
        let obj = record
            .as_object()
            .ok_or_else(|| ParquetError::Convert(format!("record is not a JSON object: {record}")))?;
        for key in obj.keys() {
            if !names.iter().any(|n| n == key) {
                names.push(key.clone());
            }
        }
    }

    let columns: Vec<ResultColumn> = names
        .iter()
        .map(|name| ResultColumn {
            name: name.clone(),
            data_type: infer_sql_type(records, name).to_string(),
        })
        .collect();

    let rows: Vec<Vec<Option<String>>> = records
        .iter()
        .map(|record| names.iter().map(|name| json_cell(record.get(name))).collect())
        .collect();

    Ok(QueryResults {
        columns,
        rows,
        summary: ExecutionSummary {
            query_id: source.to_string(),
            state: "IMPORTED".to_string(),
            bytes_scanned: 0,
            execution_time_ms: 0,
            output_location: None,
        },
    })
}

fn infer_sql_type(records: &[Value], name: &str) -> &'static str {
    let mut inferred: Option<&'static str> = None;
    for record in records {
        let value = match record.get(name) {
            Some(v) if !v.is_null() => v,
            _ => continue,
        };
        let ty = match value {
            Value::Bool(_) => "boolean",
            Value::Number(n) if n.is_i64() || n.is_u64() => "bigint",
            Value::Number(_) => "double",
            _ => "varchar",
        };
        inferred = Some(match (inferred, ty) {
            (None, t) => t,
            (Some(a), b) if a == b => a,
            (Some("bigint"), "double") | (Some("double"), "bigint") => "double",
            _ => "varchar",
        });
    }
    inferred.unwrap_or("varchar")
}

fn json_cell(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

// ── Inspection ───────────────────────────────────────────────────

/// Summary of a Parquet file: schema, size, footer metadata, and the
/// first rows rendered as strings.
#[derive(Debug, Clone)]
pub struct ParquetSummary {
    /// (column name, Arrow type) pairs in file order.
    pub columns: Vec<(String, String)>,
    /// Total rows in the file (from the footer, not the sampled head).
    pub num_rows: u64,
    /// First rows, rendered as display strings ("NULL" for nulls).
    pub head: Vec<Vec<String>>,
    /// Footer key-value metadata.
    pub key_values: Vec<(String, String)>,
}

/// Read a Parquet file and summarize its schema and first `max_rows` rows.
pub fn inspect_parquet(path: &Path, max_rows: usize) -> Result<ParquetSummary, ParquetError> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let file_meta = builder.metadata().file_metadata();
    let num_rows = file_meta.num_rows().max(0) as u64;
    let key_values: Vec<(String, String)> = file_meta
        .key_value_metadata()
        .map(|kvs| {
            kvs.iter()
                .map(|kv| (kv.key.clone(), kv.value.clone().unwrap_or_default()))
                .collect()
        })
        .unwrap_or_default();

    let columns: Vec<(String, String)> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| (f.name().clone(), f.data_type().to_string()))
        .collect();

    let mut head: Vec<Vec<String>> = Vec::new();
    let reader = builder.build()?;
    'batches: for batch in reader {
        let batch = batch?;
        for row_idx in 0..batch.num_rows() {
            if head.len() >= max_rows {
                break 'batches;
            }
            let row = batch
                .columns()
                .iter()
                .map(|col| {
                    if col.is_null(row_idx) {
                        "NULL".to_string()
                    } else {
                        array_value_to_string(col, row_idx)
                            .unwrap_or_else(|_| "?".to_string())
                    }
                })
                .collect();
            head.push(row);
        }
    }

    Ok(ParquetSummary { columns, num_rows, head, key_values })
}

impl fmt::Display for ParquetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} columns, {} rows", self.columns.len(), self.num_rows)?;
        for (name, ty) in &self.columns {
            writeln!(f, "  {name}: {ty}")?;
        }

        if !self.head.is_empty() {
            let mut widths: Vec<usize> = self.columns.iter().map(|(n, _)| n.len()).collect();
            for row in &self.head {
                for (i, cell) in row.iter().enumerate() {
                    if i < widths.len() {
                        widths[i] = widths[i].max(cell.len());
                    }
                }
            }

            writeln!(f)?;
            for (i, (name, _)) in self.columns.iter().enumerate() {
                if i > 0 {
                    write!(f, " | ")?;
                }
                write!(f, "{:<width$}", name, width = widths[i])?;
            }
            writeln!(f)?;
            for (i, w) in widths.iter().enumerate() {
                if i > 0 {
                    write!(f, "-+-")?;
                }
                write!(f, "{}", "-".repeat(*w))?;
            }
            writeln!(f)?;
            for row in &self.head {
                for (i, cell) in row.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{:<width$}", cell, width = widths[i])?;
                }
                writeln!(f)?;
            }
        }

        if !self.key_values.is_empty() {
            writeln!(f)?;
            writeln!(f, "footer metadata:")?;
            for (key, value) in &self.key_values {
                writeln!(f, "  {key} = {value}")?;
            }
        }
        Ok(())
    }
}
