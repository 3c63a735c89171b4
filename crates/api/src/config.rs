use pagecraft_core::publishing::{DEFAULT_SWEEP_BATCH_LIMIT, DEFAULT_SWEEP_INTERVAL_SECS};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on waiting for background tasks during shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT validation settings.
    pub jwt: JwtConfig,
    /// Scheduled-publish sweep settings.
    pub scheduler: SchedulerConfig,
}

/// Settings for the scheduled-publish background sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Seconds between sweeps (default: `60`).
    pub interval_secs: u64,
    /// Maximum pages published per sweep (default: `20`).
    pub batch_limit: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            batch_limit: DEFAULT_SWEEP_BATCH_LIMIT,
        }
    }
}

impl SchedulerConfig {
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `SCHEDULER_INTERVAL_SECS` | `60`    |
    /// | `SCHEDULER_BATCH_LIMIT`   | `20`    |
    pub fn from_env() -> Self {
        let interval_secs: u64 = std::env::var("SCHEDULER_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_SWEEP_INTERVAL_SECS.to_string())
            .parse()
            .expect("SCHEDULER_INTERVAL_SECS must be a valid u64");
        assert!(interval_secs > 0, "SCHEDULER_INTERVAL_SECS must be positive");

        let batch_limit: i64 = std::env::var("SCHEDULER_BATCH_LIMIT")
            .unwrap_or_else(|_| DEFAULT_SWEEP_BATCH_LIMIT.to_string())
            .parse()
            .expect("SCHEDULER_BATCH_LIMIT must be a valid i64");
        assert!(batch_limit > 0, "SCHEDULER_BATCH_LIMIT must be positive");

        Self {
            interval_secs,
            batch_limit,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    ///
    /// JWT and scheduler variables are documented on [`JwtConfig::from_env`]
    /// and [`SchedulerConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            scheduler: SchedulerConfig::from_env(),
        }
    }
}
