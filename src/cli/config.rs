//! Runtime configuration from the environment and CLI overrides.

use std::path::PathBuf;
use thiserror::Error;

/// Environment variable naming the snapshot file.
pub const SNAPSHOT_ENV: &str = "OTC_SNAPSHOT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No market snapshot given: pass --snapshot or set {SNAPSHOT_ENV}")]
    MissingSnapshot,

    #[error("{SNAPSHOT_ENV} is set but empty")]
    EmptySnapshotPath,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub snapshot: PathBuf,
}

impl AppConfig {
    /// Load `.env` (if present) and read the configuration from the process
    /// environment. `snapshot_override` (the CLI flag) wins over the variable.
    pub fn from_env(snapshot_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::resolve(snapshot_override, std::env::var(SNAPSHOT_ENV).ok())
    }

    fn resolve(snapshot_override: Option<PathBuf>, env_value: Option<String>) -> Result<Self, ConfigError> {
        if let Some(snapshot) = snapshot_override {
            return Ok(Self { snapshot });
        }
        match env_value {
            Some(value) if value.trim().is_empty() => Err(ConfigError::EmptySnapshotPath),
            Some(value) => Ok(Self {
                snapshot: PathBuf::from(value.trim()),
            }),
            None => Err(ConfigError::MissingSnapshot),
        }
    }
}
