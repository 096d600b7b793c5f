//! Record rendering: JSON or text lines with remapped built-in field names.

use super::attr::{Attr, AttrValue};
use super::level::Level;
use crate::config::duration::format_duration;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write as _;
use std::str::FromStr;

/// Output encoding of a logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(other.to_string()),
        }
    }
}

/// Names used in place of the built-in timestamp, level and message fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNames {
    pub timestamp: String,
    pub level: String,
    pub message: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            timestamp: "timestamp".to_string(),
            level: "level".to_string(),
            message: "message".to_string(),
        }
    }
}

/// How timestamps (the record's and any time-valued attribute) are written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TimeFormat {
    /// `2006-01-02T15:04:05Z`, second precision.
    #[default]
    Rfc3339,
    /// RFC 3339 with nanoseconds.
    Rfc3339Nano,
    /// Seconds since the epoch.
    Unix,
    /// Milliseconds since the epoch.
    UnixMillis,
    /// A chrono strftime pattern.
    Pattern(String),
}

impl TimeFormat {
    /// Parse a named format or a strftime pattern; `None` if the pattern is malformed.
    pub fn parse(spec: &str) -> Option<TimeFormat> {
        let format = match spec {
            "RFC3339" | "rfc3339" => TimeFormat::Rfc3339,
            "RFC3339Nano" | "rfc3339nano" => TimeFormat::Rfc3339Nano,
            "unix" => TimeFormat::Unix,
            "unixms" => TimeFormat::UnixMillis,
            pattern => {
                if pattern.is_empty()
                    || StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
                {
                    return None;
                }
                TimeFormat::Pattern(pattern.to_string())
            }
        };
        Some(format)
    }

    pub fn render(&self, time: &DateTime<Utc>) -> String {
        match self {
            TimeFormat::Rfc3339 => time.to_rfc3339_opts(SecondsFormat::Secs, true),
            TimeFormat::Rfc3339Nano => time.to_rfc3339_opts(SecondsFormat::Nanos, true),
            TimeFormat::Unix => time.timestamp().to_string(),
            TimeFormat::UnixMillis => time.timestamp_millis().to_string(),
            TimeFormat::Pattern(pattern) => time.format(pattern).to_string(),
        }
    }
}

/// A single log record before rendering.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub time: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub attrs: Vec<Attr>,
}

/// Layout settings shared by both encoders.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub names: FieldNames,
    pub time_format: TimeFormat,
}

impl Layout {
    /// Render `record` as one newline-terminated line.
    pub fn render(&self, format: OutputFormat, record: &LogRecord) -> String {
        let mut line = String::with_capacity(128);
        match format {
            OutputFormat::Json => self.render_json(record, &mut line),
            OutputFormat::Text => self.render_text(record, &mut line),
        }
        line.push('\n');
        line
    }

    fn json_value(&self, value: &AttrValue) -> serde_json::Value {
        match value {
            AttrValue::Time(t) => serde_json::Value::String(self.time_format.render(t)),
            other => other.to_json(),
        }
    }

    fn render_json(&self, record: &LogRecord, out: &mut String) {
        let time = serde_json::Value::String(self.time_format.render(&record.time));
        let level = serde_json::Value::String(record.level.as_str().to_string());
        let message = serde_json::Value::String(record.message.clone());

        out.push('{');
        push_json_field(out, &self.names.timestamp, &time);
        out.push(',');
        push_json_field(out, &self.names.level, &level);
        out.push(',');
        push_json_field(out, &self.names.message, &message);
        for attr in &record.attrs {
            out.push(',');
            push_json_field(out, &attr.key, &self.json_value(&attr.value));
        }
        out.push('}');
    }

    fn text_value(&self, value: &AttrValue) -> String {
        match value {
            AttrValue::String(s) => s.clone(),
            AttrValue::I64(n) => n.to_string(),
            AttrValue::U64(n) => n.to_string(),
            AttrValue::F64(f) => f.to_string(),
            AttrValue::Bool(b) => b.to_string(),
            AttrValue::Duration(d) => format_duration(*d),
            AttrValue::Time(t) => self.time_format.render(t),
            AttrValue::Json(v) => v.to_string(),
        }
    }

    fn render_text(&self, record: &LogRecord, out: &mut String) {
        push_text_field(out, &self.names.timestamp, &self.time_format.render(&record.time));
        out.push(' ');
        push_text_field(out, &self.names.level, record.level.as_str());
        out.push(' ');
        push_text_field(out, &self.names.message, &record.message);
        for attr in &record.attrs {
            out.push(' ');
            push_text_field(out, &attr.key, &self.text_value(&attr.value));
        }
    }
}

fn push_json_field(out: &mut String, key: &str, value: &serde_json::Value) {
    let key = serde_json::Value::String(key.to_string());
    let _ = write!(out, "{}:{}", key, value);
}

fn push_text_field(out: &mut String, key: &str, value: &str) {
    push_text_token(out, key);
    out.push('=');
    push_text_token(out, value);
}

/// Quoted tokens use JSON string escaping, the same as the JSON encoder.
fn push_text_token(out: &mut String, token: &str) {
    if needs_quoting(token) {
        let _ = write!(out, "{}", serde_json::Value::String(token.to_string()));
    } else {
        out.push_str(token);
    }
}

fn needs_quoting(s: &str) -> bool {
    s.is_empty()
        || s
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '"' || c == '=')
}
