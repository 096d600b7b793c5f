//! Structured logging whose output shape comes from configuration.
//!
//! A [`Logger`] renders one JSON object or one `key=value` line per record.
//! The built-in timestamp, level and message fields take their names from
//! [`FieldNames`], every record carries the `domain` and `service` tags, and
//! ambient attributes ride along on a [`LogContext`].
//!
//! The process default logger is reached through the free functions in this
//! module ([`info`], [`warn_ctx`], ...). Independent instances built with
//! [`Logger::new`] or [`Logger::builder`] never touch it.

mod attr;
mod context;
mod error;
mod format;
mod global;
mod layer;
mod level;
mod logger;
mod setup;

pub use attr::{Arg, Attr, AttrValue, BAD_KEY, args_to_attrs};
pub use context::LogContext;
pub use error::LogError;
pub use format::{FieldNames, Layout, LogRecord, OutputFormat, TimeFormat};
pub use global::{
    debug, debug_ctx, error, error_ctx, fatal, fatal_ctx, info, info_ctx, level, log, logger,
    set_default, set_level, warn, warn_ctx,
};
#[cfg(test)]
pub(crate) use global::TEST_LOCK;
pub use layer::LoggerLayer;
pub use level::{Level, LevelVar};
pub use logger::{Logger, LoggerBuilder, SharedBuffer};
pub use setup::{
    DOMAIN_KEY, FORMAT_KEY, LEVEL_FIELD_KEY, LEVEL_KEY, LoggerConfig, MESSAGE_FIELD_KEY,
    SERVICE_NAME_KEY, TIME_FORMAT_KEY, TIMESTAMP_FIELD_KEY, initialize, initialize_with_output,
};

#[cfg(test)]
mod tests;
