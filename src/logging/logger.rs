//! Logger instances.

use super::attr::{Arg, Attr, args_to_attrs};
use super::context::LogContext;
use super::format::{FieldNames, Layout, LogRecord, OutputFormat, TimeFormat};
use super::level::{Level, LevelVar};
use chrono::Utc;
use std::fmt;
use std::io::{self, Write};
use parking_lot::Mutex;
use std::sync::Arc;

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Structured log emitter. Cheap to clone; clones share the writer and level.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

struct Inner {
    format: OutputFormat,
    layout: Layout,
    level: LevelVar,
    attrs: Vec<Attr>,
    writer: SharedWriter,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("format", &self.inner.format)
            .field("level", &self.inner.level.get())
            .field("names", &self.inner.layout.names)
            .field("attrs", &self.inner.attrs)
            .finish()
    }
}

impl Logger {
    /// Independent stdout logger at `Debug` tagged with `domain` and `service`.
    pub fn new(format: OutputFormat, domain: &str, service: &str) -> Self {
        Self::with_writer(format, domain, service, io::stdout())
    }

    /// Like [`Logger::new`], writing to `writer`.
    pub fn with_writer(
        format: OutputFormat,
        domain: &str,
        service: &str,
        writer: impl Write + Send + 'static,
    ) -> Self {
        Self::builder(format)
            .domain(domain)
            .service(service)
            .level(LevelVar::new(Level::Debug))
            .writer(writer)
            .build()
    }

    pub fn builder(format: OutputFormat) -> LoggerBuilder {
        LoggerBuilder::new(format)
    }

    /// Logger used before initialization: text on stderr at `Info`, untagged.
    pub(crate) fn fallback() -> Self {
        Self::builder(OutputFormat::Text)
            .writer(io::stderr())
            .build()
    }

    /// A logger that adds `args` to every record, sharing writer and level.
    pub fn with(&self, args: Vec<Arg>) -> Self {
        let mut attrs = self.inner.attrs.clone();
        attrs.extend(args_to_attrs(args));
        Self {
            inner: Arc::new(Inner {
                format: self.inner.format,
                layout: self.inner.layout.clone(),
                level: self.inner.level.clone(),
                attrs,
                writer: Arc::clone(&self.inner.writer),
            }),
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.inner.format
    }

    pub fn field_names(&self) -> &FieldNames {
        &self.inner.layout.names
    }

    pub fn level(&self) -> Level {
        self.inner.level.get()
    }

    pub fn set_level(&self, level: Level) {
        self.inner.level.set(level);
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.inner.level.get()
    }

    /// Log `msg` at `level` with the context's attributes and `args`.
    pub fn log(&self, ctx: &LogContext, level: Level, msg: &str, args: Vec<Arg>) {
        if !self.enabled(level) {
            return;
        }
        self.emit(level, ctx.attrs(), msg, args_to_attrs(args));
    }

    /// Write one record; `ambient` attributes come before `attrs`.
    pub(crate) fn emit(&self, level: Level, ambient: &[Attr], msg: &str, attrs: Vec<Attr>) {
        let mut all = Vec::with_capacity(self.inner.attrs.len() + ambient.len() + attrs.len());
        all.extend(self.inner.attrs.iter().cloned());
        all.extend(ambient.iter().cloned());
        all.extend(attrs);

        let record = LogRecord {
            time: Utc::now(),
            level,
            message: msg.to_string(),
            attrs: all,
        };
        let line = self.inner.layout.render(self.inner.format, &record);

        // One write per record so concurrent callers never interleave inside a line.
        let mut writer = self.inner.writer.lock();
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }

    pub fn debug(&self, msg: &str, args: Vec<Arg>) {
        self.log(&LogContext::background(), Level::Debug, msg, args);
    }

    pub fn info(&self, msg: &str, args: Vec<Arg>) {
        self.log(&LogContext::background(), Level::Info, msg, args);
    }

    pub fn warn(&self, msg: &str, args: Vec<Arg>) {
        self.log(&LogContext::background(), Level::Warn, msg, args);
    }

    pub fn error(&self, msg: &str, args: Vec<Arg>) {
        self.log(&LogContext::background(), Level::Error, msg, args);
    }

    /// Log at `Fatal`. Terminating the process is left to the caller.
    pub fn fatal(&self, msg: &str, args: Vec<Arg>) {
        self.log(&LogContext::background(), Level::Fatal, msg, args);
    }

    pub fn debug_ctx(&self, ctx: &LogContext, msg: &str, args: Vec<Arg>) {
        self.log(ctx, Level::Debug, msg, args);
    }

    pub fn info_ctx(&self, ctx: &LogContext, msg: &str, args: Vec<Arg>) {
        self.log(ctx, Level::Info, msg, args);
    }

    pub fn warn_ctx(&self, ctx: &LogContext, msg: &str, args: Vec<Arg>) {
        self.log(ctx, Level::Warn, msg, args);
    }

    pub fn error_ctx(&self, ctx: &LogContext, msg: &str, args: Vec<Arg>) {
        self.log(ctx, Level::Error, msg, args);
    }

    pub fn fatal_ctx(&self, ctx: &LogContext, msg: &str, args: Vec<Arg>) {
        self.log(ctx, Level::Fatal, msg, args);
    }
}

/// Builder for [`Logger`] exposing every knob.
pub struct LoggerBuilder {
    format: OutputFormat,
    domain: Option<String>,
    service: Option<String>,
    layout: Layout,
    level: LevelVar,
    writer: Box<dyn Write + Send>,
}

impl LoggerBuilder {
    fn new(format: OutputFormat) -> Self {
        Self {
            format,
            domain: None,
            service: None,
            layout: Layout::default(),
            level: LevelVar::default(),
            writer: Box::new(io::stdout()),
        }
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn field_names(mut self, names: FieldNames) -> Self {
        self.layout.names = names;
        self
    }

    pub fn time_format(mut self, time_format: TimeFormat) -> Self {
        self.layout.time_format = time_format;
        self
    }

    /// Share `level` with the logger; later `set` calls take effect immediately.
    pub fn level(mut self, level: LevelVar) -> Self {
        self.level = level;
        self
    }

    pub fn writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.writer = Box::new(writer);
        self
    }

    pub fn build(self) -> Logger {
        let mut attrs = Vec::new();
        if let Some(domain) = self.domain {
            attrs.push(Attr::new("domain", domain));
        }
        if let Some(service) = self.service {
            attrs.push(Attr::new("service", service));
        }

        Logger {
            inner: Arc::new(Inner {
                format: self.format,
                layout: self.layout,
                level: self.level,
                attrs,
                writer: Arc::new(Mutex::new(self.writer)),
            }),
        }
    }
}

/// In-memory writer whose clones share one buffer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        let bytes = self.0.lock();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(String::from).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
