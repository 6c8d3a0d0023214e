use std::str::FromStr;
use std::time::Duration;

use manip_worker::WorkerPoolConfig;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}', expected 'pretty' or 'json'")),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on waiting for workers to stop (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Worker-pool size (default: available parallelism).
    pub num_workers: usize,
    /// Bounded job queue capacity (default: `num_workers`).
    pub queue_capacity: usize,
    /// Per-job wait before a dispatch times out, in milliseconds (default: `10000`).
    pub job_max_wait_ms: u64,
    /// Maximum accepted upload size in bytes (default: 20 MiB).
    pub max_body_bytes: usize,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `8080`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                       |
    /// | `NUM_WORKERS`           | available parallelism      |
    /// | `QUEUE_CAPACITY`        | `NUM_WORKERS`              |
    /// | `JOB_MAX_WAIT_MS`       | `10000`                    |
    /// | `MAX_BODY_BYTES`        | `20971520`                 |
    /// | `LOG_FORMAT`            | `pretty`                   |
    ///
    /// Panics on unparseable values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = parse_env("PORT", 8080);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_env("REQUEST_TIMEOUT_SECS", 30);
        let shutdown_timeout_secs: u64 = parse_env("SHUTDOWN_TIMEOUT_SECS", 30);

        let defaults = WorkerPoolConfig::default();
        let num_workers: usize = parse_env("NUM_WORKERS", defaults.workers);
        assert!(num_workers >= 1, "NUM_WORKERS must be at least 1");
        let queue_capacity: usize = parse_env("QUEUE_CAPACITY", num_workers);
        assert!(queue_capacity >= 1, "QUEUE_CAPACITY must be at least 1");

        let job_max_wait_ms: u64 = parse_env("JOB_MAX_WAIT_MS", defaults.max_wait.as_millis() as u64);
        let max_body_bytes: usize = parse_env("MAX_BODY_BYTES", 20 * 1024 * 1024);
        let log_format: LogFormat = parse_env("LOG_FORMAT", LogFormat::Pretty);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            num_workers,
            queue_capacity,
            job_max_wait_ms,
            max_body_bytes,
            log_format,
        }
    }

    /// Worker-pool sizing derived from this configuration.
    pub fn worker_pool_config(&self) -> WorkerPoolConfig {
        WorkerPoolConfig {
            workers: self.num_workers,
            queue_capacity: self.queue_capacity,
            max_wait: Duration::from_millis(self.job_max_wait_ms),
        }
    }
}

/// Read `key` and parse it, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} has invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}
