//! Logger construction errors.

use crate::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("invalid '{key}' configuration: {source}")]
    Config {
        key: &'static str,
        #[source]
        source: ConfigError,
    },
    #[error("invalid 'logging.level' configuration: {0}")]
    InvalidLevel(String),
    #[error("invalid 'logging.output.format' configuration: {0}")]
    InvalidFormat(String),
    #[error("invalid 'logging.output.time-field-format' configuration: {0}")]
    InvalidTimeFormat(String),
}
