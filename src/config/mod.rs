//! Configuration store for the service.
//!
//! Loads one YAML file and overlays environment variables on every lookup, so
//! `service.name` can be overridden by `SERVICE_NAME`. Values set programmatically
//! with [`ConfigStore::set`] win over both.

pub mod duration;
mod error;
mod source;

pub use error::ConfigError;
pub use source::{
    CONFIG_PATH_VAR, ENVIRONMENT_VAR, EnvSource, FLAG_FOR_MAIN_VAR, ProcessEnv, StartupArgs,
    env_key, locate_config_file,
};

use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use std::{fmt, fs};
use tracing::debug;

/// A looked-up value and where it came from.
enum Found {
    /// Typed value from the YAML file or `set`.
    Typed(Value),
    /// Untyped text from an environment variable.
    Env(String),
}

/// Key-value configuration assembled from a YAML file and environment overrides.
pub struct ConfigStore {
    file: Value,
    overrides: BTreeMap<String, Value>,
    env: Arc<dyn EnvSource>,
    path: Option<PathBuf>,
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("path", &self.path)
            .field("overrides", &self.overrides.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// Empty store reading overrides from the process environment.
    pub fn new() -> Self {
        Self::with_env(ProcessEnv)
    }

    /// Empty store reading overrides from `env`.
    pub fn with_env(env: impl EnvSource + 'static) -> Self {
        Self {
            file: Value::Null,
            overrides: BTreeMap::new(),
            env: Arc::new(env),
            path: None,
        }
    }

    /// Reset, locate the config file and load it.
    pub fn initialize(&mut self, args: &StartupArgs) -> Result<(), ConfigError> {
        self.reset();
        let path = locate_config_file(args, self.env.as_ref())?;
        self.load_file(&path)
    }

    /// Load a YAML file, replacing whatever file was loaded before.
    pub fn load_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = fs::read_to_string(path)?;
        self.load_str(&content)?;
        self.path = Some(path.to_path_buf());
        debug!(path = %path.display(), "configuration loaded");
        Ok(())
    }

    /// Load a YAML document from a string, replacing the previous file contents.
    pub fn load_str(&mut self, yaml: &str) -> Result<(), ConfigError> {
        let value: Value = serde_yaml::from_str(yaml)?;
        self.file = match value {
            Value::Mapping(_) | Value::Null => value,
            _ => return Err(ConfigError::Invalid("<root>".to_string())),
        };
        Ok(())
    }

    /// Forget the loaded file and every programmatic override.
    pub fn reset(&mut self) {
        self.file = Value::Null;
        self.overrides.clear();
        self.path = None;
    }

    /// Path of the loaded config file.
    pub fn loaded_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Override `key` programmatically.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.overrides.insert(key.to_lowercase(), value.into());
    }

    fn lookup(&self, key: &str) -> Option<Found> {
        if let Some(value) = self.overrides.get(&key.to_lowercase()) {
            if !value.is_null() {
                return Some(Found::Typed(value.clone()));
            }
        }

        if let Some(text) = self.env.var(&env_key(key)) {
            return Some(Found::Env(text));
        }

        self.file_value(key).cloned().map(Found::Typed)
    }

    fn file_value(&self, key: &str) -> Option<&Value> {
        let mut node = &self.file;
        for segment in key.split('.') {
            let Value::Mapping(map) = node else {
                return None;
            };
            node = map.iter().find_map(|(k, v)| match k {
                Value::String(s) if s.eq_ignore_ascii_case(segment) => Some(v),
                _ => None,
            })?;
        }
        (!node.is_null()).then_some(node)
    }

    /// Raw value for `key`, or `default`, or `Value::Null`.
    pub fn get(&self, key: &str, default: Option<Value>) -> Value {
        match self.lookup(key) {
            Some(Found::Typed(value)) => value,
            Some(Found::Env(text)) => Value::String(text),
            None => default.unwrap_or(Value::Null),
        }
    }

    /// Whether `key` has a value in any source.
    pub fn is_set(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    pub fn get_string(&self, key: &str, default: Option<&str>) -> Result<String, ConfigError> {
        match self.lookup(key) {
            Some(Found::Typed(Value::String(s))) => Ok(s),
            Some(Found::Typed(_)) => Err(ConfigError::Invalid(key.to_string())),
            Some(Found::Env(text)) => Ok(text),
            None => default
                .map(str::to_string)
                .ok_or_else(|| ConfigError::Missing(key.to_string())),
        }
    }

    pub fn get_bool(&self, key: &str, default: Option<bool>) -> Result<bool, ConfigError> {
        match self.lookup(key) {
            Some(Found::Typed(Value::Bool(b))) => Ok(b),
            Some(Found::Typed(_)) => Err(ConfigError::Invalid(key.to_string())),
            Some(Found::Env(text)) => {
                parse_bool(&text).ok_or_else(|| ConfigError::Invalid(key.to_string()))
            }
            None => default.ok_or_else(|| ConfigError::Missing(key.to_string())),
        }
    }

    pub fn get_int64(&self, key: &str, default: Option<i64>) -> Result<i64, ConfigError> {
        match self.lookup(key) {
            Some(found) => to_i64(&found).ok_or_else(|| ConfigError::Invalid(key.to_string())),
            None => default.ok_or_else(|| ConfigError::Missing(key.to_string())),
        }
    }

    pub fn get_int(&self, key: &str, default: Option<i32>) -> Result<i32, ConfigError> {
        match self.lookup(key) {
            Some(found) => to_i64(&found)
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(|| ConfigError::Invalid(key.to_string())),
            None => default.ok_or_else(|| ConfigError::Missing(key.to_string())),
        }
    }

    pub fn get_float(&self, key: &str, default: Option<f64>) -> Result<f64, ConfigError> {
        match self.lookup(key) {
            Some(found) => to_f64(&found).ok_or_else(|| ConfigError::Invalid(key.to_string())),
            None => default.ok_or_else(|| ConfigError::Missing(key.to_string())),
        }
    }

    /// Duration at `key`, or zero when absent or unparseable.
    ///
    /// Numbers and unitless numeric strings count nanoseconds; anything else must
    /// carry units, e.g. `1.5s` or `1h30m`.
    pub fn get_duration(&self, key: &str) -> Duration {
        let parsed = match self.lookup(key) {
            Some(Found::Typed(Value::String(s))) | Some(Found::Env(s)) => duration_from_text(&s),
            Some(Found::Typed(Value::Number(n))) => n
                .as_u64()
                .map(Duration::from_nanos)
                .or_else(|| n.as_f64().and_then(nanos_to_duration)),
            _ => None,
        };
        parsed.unwrap_or_default()
    }

    /// Strings at `key`, or empty when absent or not a list of scalars.
    pub fn get_string_slice(&self, key: &str) -> Vec<String> {
        match self.lookup(key) {
            Some(Found::Typed(Value::Sequence(items))) => {
                items.iter().filter_map(scalar_to_string).collect()
            }
            Some(Found::Typed(Value::String(s))) | Some(Found::Env(s)) => {
                s.split_whitespace().map(String::from).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Deserialize the file subtree at `key` into `T`.
    pub fn get_section<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let value = self
            .overrides
            .get(&key.to_lowercase())
            .or_else(|| self.file_value(key))
            .ok_or_else(|| ConfigError::Missing(key.to_string()))?;
        serde_yaml::from_value(value.clone()).map_err(|_| ConfigError::Invalid(key.to_string()))
    }
}

/// Accepts the spellings `1, t, T, TRUE, true, True` and their false counterparts.
fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn to_i64(found: &Found) -> Option<i64> {
    match found {
        Found::Typed(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(float_to_i64)),
        Found::Typed(Value::String(s)) | Found::Env(s) => parse_i64(s),
        Found::Typed(_) => None,
    }
}

fn to_f64(found: &Found) -> Option<f64> {
    match found {
        Found::Typed(Value::Number(n)) => n.as_f64(),
        Found::Typed(Value::String(s)) | Found::Env(s) => s.trim().parse().ok(),
        Found::Typed(_) => None,
    }
}

fn parse_i64(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse::<i64>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().and_then(float_to_i64))
}

/// Truncates toward zero; rejects NaN, infinities and out-of-range values.
fn float_to_i64(f: f64) -> Option<i64> {
    let t = f.trunc();
    (t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
}

fn duration_from_text(text: &str) -> Option<Duration> {
    let text = text.trim();
    if text.contains(|c: char| c.is_alphabetic()) {
        return duration::parse_duration(text).ok();
    }
    text.parse::<f64>().ok().and_then(nanos_to_duration)
}

/// Negative counts clamp to zero.
fn nanos_to_duration(nanos: f64) -> Option<Duration> {
    float_to_i64(nanos).map(|n| Duration::from_nanos(n.max(0) as u64))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
