//! Configuration loading.
//!
//! Hierarchical merging with figment: programmatic defaults, then the
//! project-local YAML files, then `WARDEN_*` environment variables.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid poll_batch_size: {0}. Must be at least 1")]
    InvalidPollBatchSize(u32),

    #[error("Invalid process_batch_size: {0}. Must be at least 1")]
    InvalidProcessBatchSize(u32),

    #[error("Default guardian code cannot be empty")]
    EmptyDefaultGuardian,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. `.warden/config.yaml` (project config)
    /// 3. `.warden/local.yaml` (local overrides, optional)
    /// 4. Environment variables (`WARDEN_*` prefix, `__` nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".warden/config.yaml"))
            .merge(Yaml::file(".warden/local.yaml"))
            .merge(Env::prefixed("WARDEN_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, on top of defaults.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.supervisor.poll_batch_size == 0 {
            return Err(ConfigError::InvalidPollBatchSize(
                config.supervisor.poll_batch_size,
            ));
        }
        if config.supervisor.process_batch_size == 0 {
            return Err(ConfigError::InvalidProcessBatchSize(
                config.supervisor.process_batch_size,
            ));
        }
        if config.supervisor.default_guardian.is_empty() {
            return Err(ConfigError::EmptyDefaultGuardian);
        }

        Ok(())
    }
}
