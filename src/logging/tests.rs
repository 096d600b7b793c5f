//! Tests for logging module.

use super::*;
use crate::args;
use crate::config::{ConfigError, ConfigStore};
use serde_json::Value;
use std::collections::HashMap;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

// ==================== Helpers ====================

fn store(yaml: &str) -> ConfigStore {
    let mut store = ConfigStore::with_env(HashMap::<String, String>::new());
    store.load_str(yaml).unwrap();
    store
}

fn configured(yaml: &str) -> (Logger, SharedBuffer) {
    let buffer = SharedBuffer::new();
    let logger = LoggerConfig::from_store(&store(yaml))
        .unwrap()
        .build(buffer.clone());
    (logger, buffer)
}

fn json_logger() -> (Logger, SharedBuffer) {
    let buffer = SharedBuffer::new();
    let logger = Logger::with_writer(OutputFormat::Json, "auth", "identity", buffer.clone());
    (logger, buffer)
}

fn json_lines(buffer: &SharedBuffer) -> Vec<Value> {
    buffer
        .lines()
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

const DEBUG_JSON: &str = r#"
service:
  name: identity
logging:
  level: debug
  output:
    format: json
"#;

// ==================== Level tests ====================

#[test]
fn test_level_from_config() {
    assert_eq!(Level::from_config("debug"), Some(Level::Debug));
    assert_eq!(Level::from_config("info"), Some(Level::Info));
    assert_eq!(Level::from_config("warn"), Some(Level::Warn));
    assert_eq!(Level::from_config("error"), Some(Level::Error));
    assert_eq!(Level::from_config("fatal"), None);
    assert_eq!(Level::from_config("INFO"), None);
}

#[test]
fn test_fatal_ranks_above_error() {
    assert!(Level::Fatal > Level::Error);
    assert!(Level::Error > Level::Warn);
    assert!(Level::Debug < Level::Info);
}

#[test]
fn test_level_var_is_shared_between_clones() {
    let var = LevelVar::new(Level::Warn);
    let other = var.clone();
    other.set(Level::Debug);
    assert_eq!(var.get(), Level::Debug);
    var.set(Level::Fatal);
    assert_eq!(other.get(), Level::Fatal);
}

// ==================== Attribute pairing tests ====================

#[test]
fn test_args_pair_up() {
    let attrs = args_to_attrs(args!["user", "alice", "attempts", 3]);
    assert_eq!(
        attrs,
        vec![Attr::new("user", "alice"), Attr::new("attempts", 3)]
    );
}

#[test]
fn test_trailing_key_becomes_bad_key() {
    let attrs = args_to_attrs(args!["onlykey"]);
    assert_eq!(attrs, vec![Attr::new(BAD_KEY, "onlykey")]);
}

#[test]
fn test_non_string_key_becomes_bad_key() {
    let attrs = args_to_attrs(args![42, "k", "v"]);
    assert_eq!(attrs, vec![Attr::new(BAD_KEY, 42), Attr::new("k", "v")]);
}

#[test]
fn test_ready_attrs_pass_through() {
    let attrs = args_to_attrs(args![Attr::new("a", true), "b", 1.5]);
    assert_eq!(attrs, vec![Attr::new("a", true), Attr::new("b", 1.5)]);
}

// ==================== Rendering tests ====================

#[test]
fn test_configured_json_round_trip() {
    let (logger, buffer) = configured(DEBUG_JSON);
    logger.debug("m", args!["k", "v"]);

    let lines = json_lines(&buffer);
    assert_eq!(lines.len(), 1);
    let record = &lines[0];
    assert!(record["timestamp"].is_string());
    assert_eq!(record["severity"], "debug");
    assert_eq!(record["message"], "m");
    assert_eq!(record["domain"], "default");
    assert_eq!(record["service"], "identity");
    assert_eq!(record["k"], "v");
}

#[test]
fn test_json_field_order() {
    let (logger, buffer) = json_logger();
    let ctx = LogContext::background().with(args!["request_id", "r1"]);
    logger.info_ctx(&ctx, "hello", args!["k", 1]);

    let line = &buffer.lines()[0];
    let positions: Vec<usize> = [
        "\"timestamp\"",
        "\"level\"",
        "\"message\"",
        "\"domain\"",
        "\"service\"",
        "\"request_id\"",
        "\"k\"",
    ]
    .iter()
    .map(|key| line.find(key).unwrap())
    .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", line);
}

#[test]
fn test_remapped_field_names() {
    let (logger, buffer) = configured(
        r#"
service:
  name: identity
logging:
  level: info
  output:
    level-key: sev
    message-key: msg
"#,
    );
    assert_eq!(logger.format().as_str(), "json");
    assert_eq!(logger.field_names().level, "sev");
    assert_eq!(logger.field_names().message, "msg");
    logger.warn("careful", args![]);

    let record = &json_lines(&buffer)[0];
    let object = record.as_object().unwrap();
    assert_eq!(record["sev"], "warn");
    assert_eq!(record["msg"], "careful");
    assert!(!object.contains_key("level"));
    assert!(!object.contains_key("message"));
    assert!(!object.contains_key("severity"));
}

#[test]
fn test_fatal_renders_uppercase() {
    let (logger, buffer) = json_logger();
    logger.fatal("bye", args![]);
    assert_eq!(json_lines(&buffer)[0]["level"], "FATAL");

    let text = SharedBuffer::new();
    let logger = Logger::with_writer(OutputFormat::Text, "auth", "identity", text.clone());
    logger.fatal("bye", args![]);
    assert!(text.contents().contains("level=FATAL"));
}

#[test]
fn test_levels_render_lowercase() {
    let (logger, buffer) = json_logger();
    logger.debug("a", args![]);
    logger.info("b", args![]);
    logger.warn("c", args![]);
    logger.error("d", args![]);

    let levels: Vec<Value> = json_lines(&buffer)
        .into_iter()
        .map(|r| r["level"].clone())
        .collect();
    assert_eq!(levels, vec!["debug", "info", "warn", "error"]);
}

#[test]
fn test_duration_renders_as_string() {
    let (logger, buffer) = json_logger();
    logger.info("slow", args!["elapsed", Duration::from_millis(1500)]);
    assert_eq!(json_lines(&buffer)[0]["elapsed"], "1.5s");
}

#[test]
fn test_text_format() {
    let buffer = SharedBuffer::new();
    let logger = Logger::builder(OutputFormat::Text)
        .domain("auth")
        .service("identity")
        .field_names(FieldNames {
            timestamp: "ts".to_string(),
            level: "severity".to_string(),
            message: "message".to_string(),
        })
        .writer(buffer.clone())
        .build();
    logger.info("hello world", args!["user", "alice", "note", "a=b", "wait", Duration::from_secs(2)]);

    let line = buffer.contents();
    assert!(line.starts_with("ts="), "{}", line);
    assert!(line.ends_with('\n'));
    assert!(
        line.contains(
            r#"severity=info message="hello world" domain=auth service=identity user=alice note="a=b" wait=2s"#
        ),
        "{}",
        line
    );
}

#[test]
fn test_text_quoting_uses_json_escapes() {
    let buffer = SharedBuffer::new();
    let logger = Logger::with_writer(OutputFormat::Text, "auth", "identity", buffer.clone());
    logger.info(
        "it's\tdone",
        args!["note", "say \"hi\"\nbye", "esc", "\u{1b}[0m", "empty", ""],
    );

    let line = buffer.contents();
    assert!(
        line.contains(
            r#"message="it's\tdone" domain=auth service=identity note="say \"hi\"\nbye" esc="\u001b[0m" empty="""#
        ),
        "{}",
        line
    );
    assert_eq!(line.matches('\n').count(), 1);
}

#[test]
fn test_time_format_pattern() {
    let (logger, buffer) = configured(
        r#"
service:
  name: identity
logging:
  level: info
  output:
    time-field-format: "%Y"
"#,
    );
    logger.info("m", args![]);
    let ts = json_lines(&buffer)[0]["timestamp"].as_str().unwrap().to_string();
    assert_eq!(ts.len(), 4);
    assert!(ts.chars().all(|c| c.is_ascii_digit()));
}

#[test]
fn test_time_format_parse() {
    assert_eq!(TimeFormat::parse("RFC3339"), Some(TimeFormat::Rfc3339));
    assert_eq!(TimeFormat::parse("unixms"), Some(TimeFormat::UnixMillis));
    assert_eq!(
        TimeFormat::parse("%H:%M"),
        Some(TimeFormat::Pattern("%H:%M".to_string()))
    );
    assert_eq!(TimeFormat::parse("%Q"), None);
    assert_eq!(TimeFormat::parse(""), None);
}

// ==================== Filtering tests ====================

#[test]
fn test_level_filtering_is_live() {
    let buffer = SharedBuffer::new();
    let logger = Logger::builder(OutputFormat::Json)
        .level(LevelVar::new(Level::Info))
        .writer(buffer.clone())
        .build();

    logger.debug("dropped", args![]);
    assert!(buffer.lines().is_empty());

    logger.set_level(Level::Debug);
    logger.debug("kept", args![]);
    assert_eq!(buffer.lines().len(), 1);

    logger.set_level(Level::Error);
    logger.warn("dropped", args![]);
    logger.fatal("kept", args![]);
    assert_eq!(buffer.lines().len(), 2);
}

#[test]
fn test_derived_logger_shares_level_and_writer() {
    let (logger, buffer) = json_logger();
    let child = logger.with(args!["component", "tokens"]);
    logger.set_level(Level::Error);

    child.info("dropped", args![]);
    child.error("kept", args![]);

    let lines = json_lines(&buffer);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["component"], "tokens");
}

// ==================== Context tests ====================

#[test]
fn test_context_branches_are_isolated() {
    let (logger, buffer) = json_logger();
    let base = LogContext::background().with(args!["a", 1]);
    let first = base.with(args!["b", 2]);
    let second = base.with(args!["c", 3]);

    logger.info_ctx(&first, "first", args![]);
    logger.info_ctx(&second, "second", args![]);
    logger.info_ctx(&base, "base", args![]);

    let lines = json_lines(&buffer);
    assert_eq!(lines[0]["a"], 1);
    assert_eq!(lines[0]["b"], 2);
    assert!(lines[0].get("c").is_none());

    assert_eq!(lines[1]["a"], 1);
    assert_eq!(lines[1]["c"], 3);
    assert!(lines[1].get("b").is_none());

    assert_eq!(lines[2]["a"], 1);
    assert!(lines[2].get("b").is_none());
    assert!(lines[2].get("c").is_none());
}

#[test]
fn test_context_keeps_attach_order() {
    let ctx = LogContext::background()
        .with(args!["x", 1])
        .with(args!["y", 2, "z", 3]);
    let keys: Vec<&str> = ctx.attrs().iter().map(|a| a.key.as_str()).collect();
    assert_eq!(keys, vec!["x", "y", "z"]);
}

// ==================== Configuration tests ====================

#[test]
fn test_config_defaults() {
    let config = LoggerConfig::from_store(&store(
        "service:\n  name: identity\nlogging:\n  level: warn\n",
    ))
    .unwrap();

    assert_eq!(config.level, Level::Warn);
    assert_eq!(config.format, OutputFormat::Json);
    assert_eq!(config.domain, "default");
    assert_eq!(config.service, "identity");
    assert_eq!(config.names.timestamp, "timestamp");
    assert_eq!(config.names.level, "severity");
    assert_eq!(config.names.message, "message");
    assert_eq!(config.time_format, TimeFormat::Rfc3339);
}

#[test]
fn test_config_invalid_level() {
    let err = LoggerConfig::from_store(&store(
        "service:\n  name: identity\nlogging:\n  level: fatal\n",
    ))
    .unwrap_err();
    assert!(matches!(err, LogError::InvalidLevel(ref l) if l == "fatal"));
}

#[test]
fn test_config_missing_level() {
    let err = LoggerConfig::from_store(&store("service:\n  name: identity\n")).unwrap_err();
    assert!(matches!(
        err,
        LogError::Config {
            key: LEVEL_KEY,
            source: ConfigError::Missing(_)
        }
    ));
}

#[test]
fn test_config_missing_service_name() {
    let err = LoggerConfig::from_store(&store("logging:\n  level: info\n")).unwrap_err();
    assert!(matches!(
        err,
        LogError::Config {
            key: SERVICE_NAME_KEY,
            source: ConfigError::Missing(_)
        }
    ));
}

#[test]
fn test_config_invalid_format() {
    let err = LoggerConfig::from_store(&store(
        "service:\n  name: identity\nlogging:\n  level: info\n  output:\n    format: xml\n",
    ))
    .unwrap_err();
    assert!(matches!(err, LogError::InvalidFormat(ref f) if f == "xml"));
}

#[test]
fn test_config_wrong_type_domain() {
    let err = LoggerConfig::from_store(&store(
        "service:\n  name: identity\nlogging:\n  level: info\n  domain: 5\n",
    ))
    .unwrap_err();
    assert!(matches!(
        err,
        LogError::Config {
            key: DOMAIN_KEY,
            source: ConfigError::Invalid(_)
        }
    ));
}

// ==================== Concurrency tests ====================

#[test]
fn test_concurrent_records_are_whole_lines() {
    let (logger, buffer) = json_logger();
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let logger = logger.clone();
            thread::spawn(move || {
                let ctx = LogContext::background().with(args!["worker", worker]);
                for i in 0..100 {
                    logger.info_ctx(&ctx, "tick", args!["i", i, "padding", "x".repeat(64)]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let lines = json_lines(&buffer);
    assert_eq!(lines.len(), 800);
    assert!(lines.iter().all(|r| r["message"] == "tick"));
}

/// Panics on its first write, then forwards to the buffer.
struct PanicOnce {
    panicked: bool,
    buffer: SharedBuffer,
}

impl Write for PanicOnce {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.panicked {
            self.panicked = true;
            panic!("writer failed");
        }
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_writer_panic_does_not_wedge_logger() {
    let buffer = SharedBuffer::new();
    let logger = Logger::with_writer(
        OutputFormat::Json,
        "auth",
        "identity",
        PanicOnce {
            panicked: false,
            buffer: buffer.clone(),
        },
    );

    let panicking = logger.clone();
    assert!(thread::spawn(move || panicking.info("lost", args![])).join().is_err());

    logger.info("kept", args![]);
    let lines = json_lines(&buffer);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["message"], "kept");
}

// ==================== Default logger and tracing bridge ====================

#[test]
fn test_default_logger_functions() {
    let _guard = super::global::TEST_LOCK.lock();
    let buffer = SharedBuffer::new();
    initialize_with_output(&store(DEBUG_JSON), buffer.clone()).unwrap();

    info("one", args!["k", "v"]);
    let ctx = LogContext::background().with(args!["trace", "t-1"]);
    warn_ctx(&ctx, "two", args![]);
    set_level(Level::Error);
    assert_eq!(level(), Level::Error);
    debug("dropped", args![]);
    fatal("three", args![]);

    let lines = json_lines(&buffer);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["k"], "v");
    assert_eq!(lines[1]["trace"], "t-1");
    assert_eq!(lines[2]["severity"], "FATAL");
}

#[test]
fn test_tracing_events_use_logger_format() {
    use tracing_subscriber::layer::SubscriberExt;

    let (logger, buffer) = configured(DEBUG_JSON);
    let subscriber = tracing_subscriber::registry().with(LoggerLayer::new(logger));

    tracing::subscriber::with_default(subscriber, || {
        let span = tracing::info_span!("request", request_id = 7);
        let _entered = span.enter();
        tracing::warn!(user = "alice", attempts = 3u64, "login failed");
        tracing::trace!("verbose");
    });

    let lines = json_lines(&buffer);
    assert_eq!(lines.len(), 2);
    let record = &lines[0];
    assert_eq!(record["severity"], "warn");
    assert_eq!(record["message"], "login failed");
    assert_eq!(record["request_id"], 7);
    assert_eq!(record["user"], "alice");
    assert_eq!(record["attempts"], 3);
    assert_eq!(lines[1]["severity"], "debug");
}

#[test]
fn test_tracing_follows_default_logger_swap() {
    use tracing_subscriber::layer::SubscriberExt;

    let _guard = super::global::TEST_LOCK.lock();
    let first = SharedBuffer::new();
    initialize_with_output(&store(DEBUG_JSON), first.clone()).unwrap();
    let subscriber = tracing_subscriber::registry().with(LoggerLayer::default_logger());

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!("before swap");

        let second = SharedBuffer::new();
        let text = Logger::builder(OutputFormat::Text)
            .service("identity")
            .level(LevelVar::new(Level::Debug))
            .writer(second.clone())
            .build();
        set_default(text);
        tracing::info!(user = "alice", "after swap");

        let lines = second.lines();
        assert_eq!(lines.len(), 1);
        assert!(
            lines[0].contains(r#"level=info message="after swap" service=identity user=alice"#),
            "{}",
            lines[0]
        );
    });

    let lines = json_lines(&first);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["message"], "before swap");
}
