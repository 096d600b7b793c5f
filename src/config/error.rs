//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading and lookup error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration '{0}'")]
    Missing(String),
    #[error("invalid configuration '{0}'")]
    Invalid(String),
    #[error("configuration directory not specified")]
    NoLocation,
    #[error("unsupported config file extension: {}", .0.display())]
    UnsupportedExtension(PathBuf),
    #[error("error loading .env file: {0}")]
    DotEnv(#[from] dotenvy::Error),
    #[error("failed to read config file: {0}")]
    ReadFile(#[from] std::io::Error),
    #[error("config read error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl ConfigError {
    /// The configuration key this error is about, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            ConfigError::Missing(key) | ConfigError::Invalid(key) => Some(key),
            _ => None,
        }
    }
}
