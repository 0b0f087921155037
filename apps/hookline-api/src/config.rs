//! Application configuration loaded from environment variables.
//!
//! Fail-fast: an unparseable value aborts startup with a clear message
//! instead of silently falling back to a default.

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Runtime configuration for the hookline API server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Socket address the API listens on.
    pub bind_addr: String,

    /// Postgres connection string. When unset the service runs on
    /// in-memory stores and loses all state on restart.
    pub database_url: Option<String>,

    /// Number of delivery workers consuming the queue.
    pub worker_count: usize,

    /// Capacity of the delivery channel.
    pub queue_capacity: usize,

    /// Maximum delivery attempts per task.
    pub max_retries: i32,

    /// Timeout for one outbound delivery request.
    pub request_timeout: Duration,

    /// Validity window for cached subscriptions.
    pub cache_ttl: Duration,

    /// Age after which delivery records are purged.
    pub retention_max_age: Duration,

    /// Interval between retention sweeps.
    pub retention_interval: Duration,

    /// Default tracing filter, overridable via `RUST_LOG`.
    pub log_filter: String,
}

impl AppConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            database_url: env::var("DATABASE_URL").ok(),
            worker_count: parse_var("WORKER_COUNT", 4)?,
            queue_capacity: parse_var("QUEUE_CAPACITY", 1024)?,
            max_retries: parse_var("MAX_RETRIES", 5)?,
            request_timeout: Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", 5)?),
            cache_ttl: Duration::from_secs(parse_var("CACHE_TTL_SECS", 3600)?),
            retention_max_age: Duration::from_secs(
                parse_var("RETENTION_MAX_AGE_HOURS", 72u64)? * 3600,
            ),
            retention_interval: Duration::from_secs(parse_var("RETENTION_INTERVAL_SECS", 3600)?),
            log_filter: env::var("LOG_FILTER").unwrap_or_else(|_| "info".to_string()),
        };

        if config.worker_count == 0 {
            return Err(ConfigError::Invalid {
                name: "WORKER_COUNT",
                value: "0".to_string(),
            });
        }
        if config.max_retries < 1 {
            return Err(ConfigError::Invalid {
                name: "MAX_RETRIES",
                value: config.max_retries.to_string(),
            });
        }

        Ok(config)
    }
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_uses_default_when_unset() {
        env::remove_var("HOOKLINE_TEST_UNSET");
        let value: u64 = parse_var("HOOKLINE_TEST_UNSET", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_var_reads_environment() {
        env::set_var("HOOKLINE_TEST_SET", "7");
        let value: u64 = parse_var("HOOKLINE_TEST_SET", 42).unwrap();
        assert_eq!(value, 7);
        env::remove_var("HOOKLINE_TEST_SET");
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        env::set_var("HOOKLINE_TEST_BAD", "not-a-number");
        let result: Result<u64, _> = parse_var("HOOKLINE_TEST_BAD", 42);
        assert!(result.is_err());
        env::remove_var("HOOKLINE_TEST_BAD");
    }
}
