//! Bridge from `tracing` events to a [`Logger`].
//!
//! Span fields become ambient attributes (outermost span first) and event
//! fields become call-site attributes, so `tracing::info!` output follows the
//! configured format and field names.

use super::attr::Attr;
use super::global;
use super::level::Level;
use super::logger::Logger;
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::span;
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

/// Layer that renders events through a logger.
#[derive(Debug, Clone)]
pub struct LoggerLayer {
    /// `None` means whatever the process default is at event time.
    logger: Option<Logger>,
}

impl LoggerLayer {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger: Some(logger),
        }
    }

    /// Follow the process default logger.
    pub fn default_logger() -> Self {
        Self { logger: None }
    }

    fn logger(&self) -> Logger {
        self.logger.clone().unwrap_or_else(global::logger)
    }
}

/// Fields recorded on a span.
struct SpanAttrs(Vec<Attr>);

struct AttrVisitor<'a> {
    attrs: &'a mut Vec<Attr>,
    message: Option<String>,
}

impl<'a> AttrVisitor<'a> {
    fn new(attrs: &'a mut Vec<Attr>) -> Self {
        Self {
            attrs,
            message: None,
        }
    }
}

impl Visit for AttrVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.attrs.push(Attr::new(field.name(), value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.attrs.push(Attr::new(field.name(), value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.attrs.push(Attr::new(field.name(), value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.attrs.push(Attr::new(field.name(), value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.attrs.push(Attr::new(field.name(), value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.attrs.push(Attr::new(field.name(), value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.attrs.push(Attr::new(field.name(), format!("{:?}", value)));
        }
    }
}

fn map_level(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::ERROR => Level::Error,
        tracing::Level::WARN => Level::Warn,
        tracing::Level::INFO => Level::Info,
        _ => Level::Debug,
    }
}

impl<S> Layer<S> for LoggerLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut fields = Vec::new();
        attrs.record(&mut AttrVisitor::new(&mut fields));
        span.extensions_mut().insert(SpanAttrs(fields));
    }

    fn on_record(&self, id: &span::Id, values: &span::Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        if let Some(SpanAttrs(fields)) = extensions.get_mut::<SpanAttrs>() {
            values.record(&mut AttrVisitor::new(fields));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let level = map_level(event.metadata().level());
        let logger = self.logger();
        if !logger.enabled(level) {
            return;
        }

        let mut ambient = Vec::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(SpanAttrs(fields)) = span.extensions().get::<SpanAttrs>() {
                    ambient.extend(fields.iter().cloned());
                }
            }
        }

        let mut attrs = Vec::new();
        let mut visitor = AttrVisitor::new(&mut attrs);
        event.record(&mut visitor);
        let message = visitor.message.take().unwrap_or_default();

        logger.emit(level, &ambient, &message, attrs);
    }
}
