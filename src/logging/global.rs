//! The process default logger and functions logging through it.

use super::attr::Arg;
use super::context::LogContext;
use super::level::Level;
use super::logger::Logger;
use parking_lot::RwLock;
use std::sync::OnceLock;

static DEFAULT: OnceLock<RwLock<Logger>> = OnceLock::new();

fn default_cell() -> &'static RwLock<Logger> {
    DEFAULT.get_or_init(|| RwLock::new(Logger::fallback()))
}

/// Snapshot of the default logger; the lock is not held while writing.
fn current() -> Logger {
    default_cell().read().clone()
}

/// Serializes tests that swap the process default logger.
#[cfg(test)]
pub(crate) static TEST_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());

/// Make `logger` the process default.
pub fn set_default(logger: Logger) {
    *default_cell().write() = logger;
}

/// The current default logger.
pub fn logger() -> Logger {
    current()
}

/// Minimum level of the default logger.
pub fn level() -> Level {
    current().level()
}

/// Change the default logger's minimum level in place.
pub fn set_level(level: Level) {
    current().set_level(level);
}

pub fn log(ctx: &LogContext, level: Level, msg: &str, args: Vec<Arg>) {
    current().log(ctx, level, msg, args);
}

pub fn debug(msg: &str, args: Vec<Arg>) {
    current().debug(msg, args);
}

pub fn info(msg: &str, args: Vec<Arg>) {
    current().info(msg, args);
}

pub fn warn(msg: &str, args: Vec<Arg>) {
    current().warn(msg, args);
}

pub fn error(msg: &str, args: Vec<Arg>) {
    current().error(msg, args);
}

pub fn fatal(msg: &str, args: Vec<Arg>) {
    current().fatal(msg, args);
}

pub fn debug_ctx(ctx: &LogContext, msg: &str, args: Vec<Arg>) {
    current().debug_ctx(ctx, msg, args);
}

pub fn info_ctx(ctx: &LogContext, msg: &str, args: Vec<Arg>) {
    current().info_ctx(ctx, msg, args);
}

pub fn warn_ctx(ctx: &LogContext, msg: &str, args: Vec<Arg>) {
    current().warn_ctx(ctx, msg, args);
}

pub fn error_ctx(ctx: &LogContext, msg: &str, args: Vec<Arg>) {
    current().error_ctx(ctx, msg, args);
}

pub fn fatal_ctx(ctx: &LogContext, msg: &str, args: Vec<Arg>) {
    current().fatal_ctx(ctx, msg, args);
}
