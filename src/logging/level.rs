//! Severity levels and the shared, live-mutable minimum level.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI8, Ordering};

/// Record severity, ordered `Debug < Info < Warn < Error < Fatal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i8)]
pub enum Level {
    Debug = -4,
    Info = 0,
    Warn = 4,
    Error = 8,
    /// Marks a record logged right before the caller terminates the process.
    /// Not selectable from configuration.
    Fatal = 12,
}

impl Level {
    /// Parse a configured level name. `Fatal` is not accepted.
    pub fn from_config(name: &str) -> Option<Level> {
        match name {
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" => Some(Level::Warn),
            "error" => Some(Level::Error),
            _ => None,
        }
    }

    /// Rendered level value: lowercase names, `FATAL` in uppercase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "FATAL",
        }
    }

    fn from_i8(value: i8) -> Level {
        match value {
            i8::MIN..=-4 => Level::Debug,
            -3..=0 => Level::Info,
            1..=4 => Level::Warn,
            5..=8 => Level::Error,
            _ => Level::Fatal,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared minimum level. Clones observe each other's `set`.
#[derive(Debug, Clone)]
pub struct LevelVar(Arc<AtomicI8>);

impl LevelVar {
    pub fn new(level: Level) -> Self {
        Self(Arc::new(AtomicI8::new(level as i8)))
    }

    pub fn get(&self) -> Level {
        Level::from_i8(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, level: Level) {
        self.0.store(level as i8, Ordering::Relaxed);
    }
}

impl Default for LevelVar {
    fn default() -> Self {
        Self::new(Level::Info)
    }
}
