//! Building a logger from the configuration store.

use super::error::LogError;
use super::format::{FieldNames, OutputFormat, TimeFormat};
use super::global;
use super::level::{Level, LevelVar};
use super::logger::Logger;
use crate::config::ConfigStore;
use std::io::{self, Write};

pub const LEVEL_KEY: &str = "logging.level";
pub const FORMAT_KEY: &str = "logging.output.format";
pub const DOMAIN_KEY: &str = "logging.domain";
pub const TIMESTAMP_FIELD_KEY: &str = "logging.output.timestamp-key";
pub const LEVEL_FIELD_KEY: &str = "logging.output.level-key";
pub const MESSAGE_FIELD_KEY: &str = "logging.output.message-key";
pub const TIME_FORMAT_KEY: &str = "logging.output.time-field-format";
pub const SERVICE_NAME_KEY: &str = "service.name";

/// Logger settings resolved from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggerConfig {
    pub level: Level,
    pub format: OutputFormat,
    pub domain: String,
    pub service: String,
    pub names: FieldNames,
    pub time_format: TimeFormat,
}

impl LoggerConfig {
    /// Read `logging.*` and `service.name`; level and service name are required.
    pub fn from_store(store: &ConfigStore) -> Result<Self, LogError> {
        let string = |key: &'static str, default: Option<&str>| {
            store
                .get_string(key, default)
                .map_err(|source| LogError::Config { key, source })
        };

        let level_name = string(LEVEL_KEY, None)?;
        let level = Level::from_config(&level_name).ok_or(LogError::InvalidLevel(level_name))?;

        let format_name = string(FORMAT_KEY, Some("json"))?;
        let format = format_name
            .parse::<OutputFormat>()
            .map_err(LogError::InvalidFormat)?;

        let names = FieldNames {
            timestamp: string(TIMESTAMP_FIELD_KEY, Some("timestamp"))?,
            level: string(LEVEL_FIELD_KEY, Some("severity"))?,
            message: string(MESSAGE_FIELD_KEY, Some("message"))?,
        };

        let time_spec = string(TIME_FORMAT_KEY, Some("RFC3339"))?;
        let time_format =
            TimeFormat::parse(&time_spec).ok_or(LogError::InvalidTimeFormat(time_spec))?;

        Ok(Self {
            level,
            format,
            domain: string(DOMAIN_KEY, Some("default"))?,
            service: string(SERVICE_NAME_KEY, None)?,
            names,
            time_format,
        })
    }

    /// Build a logger writing to `writer`.
    pub fn build(self, writer: impl Write + Send + 'static) -> Logger {
        Logger::builder(self.format)
            .domain(self.domain)
            .service(self.service)
            .field_names(self.names)
            .time_format(self.time_format)
            .level(LevelVar::new(self.level))
            .writer(writer)
            .build()
    }
}

/// Build the configured stdout logger and make it the process default.
pub fn initialize(store: &ConfigStore) -> Result<Logger, LogError> {
    initialize_with_output(store, io::stdout())
}

/// Build the configured logger on `writer` and make it the process default.
pub fn initialize_with_output(
    store: &ConfigStore,
    writer: impl Write + Send + 'static,
) -> Result<Logger, LogError> {
    let logger = LoggerConfig::from_store(store)?.build(writer);
    global::set_default(logger.clone());
    Ok(logger)
}
