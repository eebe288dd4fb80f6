//! Startup configuration read from the environment.

use std::time::Duration;

use progression_coordinator::retry::RetryPolicy;

use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_CONFLICT_MAX_RETRIES: u32 = 3;
const DEFAULT_CONFLICT_RETRY_INITIAL_DELAY_MS: u64 = 10;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// PostgreSQL connection string. `None` runs against the in-memory store.
    pub database_url: Option<String>,
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Upper bound on pooled database connections.
    pub database_max_connections: u32,
    /// How many times a command is re-run after a concurrency conflict.
    pub conflict_max_retries: u32,
    /// Backoff before the first re-run.
    pub conflict_retry_initial_delay: Duration,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set but does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which returns the value of a
    /// variable if it is set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set but does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let database_max_connections =
            parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let conflict_max_retries =
            parse_or(&lookup, "CONFLICT_MAX_RETRIES", DEFAULT_CONFLICT_MAX_RETRIES)?;
        let delay_ms = parse_or(
            &lookup,
            "CONFLICT_RETRY_INITIAL_DELAY_MS",
            DEFAULT_CONFLICT_RETRY_INITIAL_DELAY_MS,
        )?;

        Ok(Self {
            database_url,
            host,
            port,
            database_max_connections,
            conflict_max_retries,
            conflict_retry_initial_delay: Duration::from_millis(delay_ms),
        })
    }

    /// The `HOST:PORT` pair to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Conflict retry policy built from the configured limits.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.conflict_max_retries, self.conflict_retry_initial_delay)
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} must be a valid number: {e}"))),
    }
}
