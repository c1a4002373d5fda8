use std::env;

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Used when neither `ATHENA_REGION` nor `AWS_REGION` is set.
const DEFAULT_REGION: &str = "us-east-1";

const DEFAULT_WORKGROUP: &str = "primary";

/// The original handler slept one second between status checks.
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// 600 checks at the default interval gives queries ten minutes to finish.
const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 600;

// ── Env helpers ──────────────────────────────────────────────────

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn required(key: &str) -> Result<String, RelayError> {
    env_opt(key).ok_or_else(|| RelayError::Config(format!("{key} is not set")))
}

// ── RelayConfig ──────────────────────────────────────────────────

/// Configuration for the query relay, read from the environment.
///
/// `ATHENA_DATABASE` and `ATHENA_OUTPUT` are required; everything else
/// has a default. `ATHENA_REGION` falls back to `AWS_REGION` before the
/// built-in default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Athena database queries run against.
    pub database: String,
    /// S3 location where Athena persists result artifacts.
    pub output_location: String,
    /// AWS region for the Athena client.
    pub region: String,
    /// Athena workgroup.
    pub workgroup: String,
    /// Fixed wait between status checks, in milliseconds.
    pub poll_interval_ms: u64,
    /// Status checks allowed before the invocation gives up.
    pub max_poll_attempts: u32,
}

impl RelayConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, RelayError> {
        let region = env_opt("ATHENA_REGION")
            .or_else(|| env_opt("AWS_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Ok(Self {
            database: required("ATHENA_DATABASE")?,
            output_location: required("ATHENA_OUTPUT")?,
            region,
            workgroup: env_or("ATHENA_WORKGROUP", DEFAULT_WORKGROUP),
            poll_interval_ms: env_u64("RELAY_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS),
            max_poll_attempts: env_u32("RELAY_MAX_POLL_ATTEMPTS", DEFAULT_MAX_POLL_ATTEMPTS),
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────
