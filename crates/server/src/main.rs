//! relay-server — HTTP front-end for the Athena query relay.

mod api;
mod router;
mod state;

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use query_relay::{AthenaExecutor, QueryRelay, RelayConfig};

use crate::state::AppState;

/// HTTP front-end for the Athena query relay.
#[derive(Parser, Debug)]
#[command(name = "relay-server", version, about)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "RELAY_LISTEN", default_value = "0.0.0.0:8080")]
    listen: String,
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

    let config = RelayConfig::from_env()?;
    let executor = AthenaExecutor::new(&config).await;
    let relay = QueryRelay::new(Box::new(executor), config);

    let state = Arc::new(AppState { relay });
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!(listen = %cli.listen, "relay server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
