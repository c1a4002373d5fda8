//! relay — submit SQL to Athena and work with result files.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use query_relay::{
    inspect_parquet, records_to_results, write_parquet, AthenaExecutor, QueryRelay, RelayConfig,
};

/// Relay SQL queries to AWS Athena and work with Parquet result files.
#[derive(Parser, Debug)]
#[command(name = "relay", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a query, wait for a terminal state, print the results.
    Query {
        /// SQL to execute.
        sql: String,

        /// Print the response envelope as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Submit a query and write the results to a Parquet file.
    Export {
        /// SQL to execute.
        sql: String,

        /// Output path; defaults to <query-execution-id>.parquet.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert a JSON array of records to a typed Parquet file.
    Convert {
        /// Input file holding a JSON array of flat objects.
        input: PathBuf,

        /// Output Parquet path.
        output: PathBuf,
    },

    /// Print the schema and first rows of a Parquet file.
    Inspect {
        /// Parquet file to inspect.
        path: PathBuf,

        /// Number of rows to show.
        #[arg(long, default_value_t = 10)]
        rows: usize,
    },
}

async fn build_relay() -> anyhow::Result<QueryRelay> {
    let config = RelayConfig::from_env()?;
    let executor = AthenaExecutor::new(&config).await;
    Ok(QueryRelay::new(Box::new(executor), config))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Query { sql, json } => {
            let relay = build_relay().await?;
            if json {
                let event = serde_json::json!({ "query": sql });
                let response = relay.handle(&event).await;
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                let results = relay.execute(&sql).await?;
                println!("{results}");
            }
        }

        Command::Export { sql, output } => {
            let relay = build_relay().await?;
            let results = relay.execute(&sql).await?;
            let path = output.unwrap_or_else(|| {
                PathBuf::from(format!("{}.parquet", results.summary.query_id))
            });
            let rows = write_parquet(&results, &path)?;
            info!(path = %path.display(), rows, "wrote Parquet export");
        }

        Command::Convert { input, output } => {
            let raw = std::fs::read_to_string(&input)?;
            let records: Vec<serde_json::Value> = serde_json::from_str(&raw)?;
            let source = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("records");
            let results = records_to_results(&records, source)?;
            let rows = write_parquet(&results, &output)?;
            info!(path = %output.display(), rows, "converted records to Parquet");
        }

        Command::Inspect { path, rows } => {
            let summary = inspect_parquet(&path, rows)?;
            println!("{summary}");
        }
    }

    Ok(())
}
