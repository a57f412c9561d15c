/// Configuration management for the stepflow engine
///
/// Handles server configuration, database location, job processing and
/// credential encryption. Every value can be overridden from the environment.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Job queue and step execution limits
    pub runtime: RuntimeConfig,
    /// Credential encryption
    pub security: SecurityConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Directory holding the SQLite file (default: "data")
    /// Creates: {data_dir}/stepflow.db
    pub data_dir: String,
}

/// Job processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Number of workers consuming the job queue
    pub worker_concurrency: usize,
    /// Jobs that may wait in the queue before intake applies backpressure
    pub queue_capacity: usize,
    /// Wall-clock budget for one Lua script evaluation
    pub script_timeout_ms: u64,
    /// Timeout for one outbound HTTP request
    pub http_timeout_ms: u64,
}

/// Credential encryption configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// 32-byte secret for the credential vault; startup fails without it
    #[serde(skip_serializing)]
    pub encryption_key: Option<String>,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("encryption_key", &self.encryption_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl DatabaseConfig {
    /// Path of the engine's SQLite file
    pub fn database_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join("stepflow.db")
    }
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for k8s/container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("STEPFLOW_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env_or("STEPFLOW_PORT", 3000),
            },
            database: DatabaseConfig {
                data_dir: std::env::var("STEPFLOW_DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            },
            runtime: RuntimeConfig::default(),
            security: SecurityConfig {
                encryption_key: std::env::var("STEPFLOW_ENCRYPTION_KEY").ok(),
            },
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_concurrency: env_or("STEPFLOW_WORKER_CONCURRENCY", 5),
            queue_capacity: env_or("STEPFLOW_QUEUE_CAPACITY", 1024),
            script_timeout_ms: env_or("STEPFLOW_SCRIPT_TIMEOUT_MS", 5000),
            http_timeout_ms: env_or("STEPFLOW_HTTP_TIMEOUT_MS", 30_000),
        }
    }
}

/// Parse an environment variable, falling back on absence or parse failure
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}
