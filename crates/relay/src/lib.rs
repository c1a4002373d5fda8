pub mod config;
pub mod error;
pub mod event;
pub mod executor;
pub mod parquet;
pub mod relay;
pub mod result;

pub use config::RelayConfig;
pub use error::{EventError, RelayError};
pub use event::extract_query;
pub use executor::{AthenaExecutor, ExecutionStatus, QueryExecutor};
pub use parquet::{
    inspect_parquet, records_to_results, write_parquet, ParquetError, ParquetSummary,
};
pub use relay::{QueryRelay, RelayResponse};
pub use result::{ExecutionSummary, QueryResults, ResultColumn};
