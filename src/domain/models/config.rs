use serde::{Deserialize, Serialize};

/// Main configuration structure for Warden
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Supervisor loop configuration
    #[serde(default)]
    pub supervisor: SupervisorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            supervisor: SupervisorConfig::default(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum pool connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".warden/warden.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Supervisor loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SupervisorConfig {
    /// Seconds the loop waits for a wake signal before polling anyway
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    /// Maximum audit rows the poller converts per scan
    #[serde(default = "default_poll_batch_size")]
    pub poll_batch_size: u32,

    /// Maximum pending inbox rows handled per cycle
    #[serde(default = "default_process_batch_size")]
    pub process_batch_size: u32,

    /// Whether each cycle re-queues failed inbox rows below the retry
    /// ceiling. Off by default: failed rows wait for explicit intervention.
    #[serde(default)]
    pub retry_failed_on_cycle: bool,

    /// Retry ceiling for failed inbox rows
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Registry code of the guardian chosen when no assigner rule matches
    #[serde(default = "default_guardian_code")]
    pub default_guardian: String,
}

const fn default_poll_timeout_secs() -> u64 {
    30
}

const fn default_poll_batch_size() -> u32 {
    100
}

const fn default_process_batch_size() -> u32 {
    50
}

const fn default_max_retries() -> u32 {
    3
}

fn default_guardian_code() -> String {
    "smoke_test".to_string()
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            poll_timeout_secs: default_poll_timeout_secs(),
            poll_batch_size: default_poll_batch_size(),
            process_batch_size: default_process_batch_size(),
            retry_failed_on_cycle: false,
            max_retries: default_max_retries(),
            default_guardian: default_guardian_code(),
        }
    }
}
