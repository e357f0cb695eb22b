//! One JSON object per line for every tracing event.
//!
//! Field values whose name marks credential material (tokens, passwords,
//! cookies, authorization headers) are replaced with [`REDACTED`] before
//! they reach the writer.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fmt;
use std::io::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

pub const REDACTED: &str = "[REDACTED]";

const SENSITIVE_MARKERS: &[&str] = &["token", "password", "authorization", "cookie", "secret"];

/// Whether a field name marks secret material. Case-insensitive substring match.
pub fn is_sensitive_field(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    SENSITIVE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// A line of the log file.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: &'static str,
    pub service: String,
    pub pid: u32,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
    /// Enclosing spans, outermost first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<String>,
    /// `file:line` of the callsite when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Default)]
struct Collected {
    message: String,
    fields: Map<String, Value>,
}

impl Collected {
    fn put(&mut self, field: &Field, value: Value) {
        let name = field.name();
        if name == "message" {
            self.message = match value {
                Value::String(text) => text,
                other => other.to_string(),
            };
            return;
        }
        let value = if is_sensitive_field(name) {
            Value::from(REDACTED)
        } else {
            value
        };
        self.fields.insert(name.to_owned(), value);
    }
}

impl Visit for Collected {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // NaN and infinities have no JSON number form.
        let value = Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.put(field, value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, Value::String(value.to_string()));
    }
}

/// Layer that serializes each event as a [`LogEntry`] into `make_writer`.
pub struct JsonLayer<W> {
    service: String,
    pid: u32,
    make_writer: W,
}

impl<W> JsonLayer<W> {
    pub fn new(service: String, make_writer: W) -> Self {
        Self {
            service,
            pid: std::process::id(),
            make_writer,
        }
    }

    fn entry<S>(&self, event: &Event<'_>, ctx: &Context<'_, S>) -> LogEntry
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let mut collected = Collected::default();
        event.record(&mut collected);

        let meta = event.metadata();
        let spans = ctx
            .event_scope(event)
            .map(|scope| scope.from_root().map(|span| span.name().to_owned()).collect())
            .unwrap_or_default();
        let location = match (meta.file(), meta.line()) {
            (Some(file), Some(line)) => Some(format!("{file}:{line}")),
            (Some(file), None) => Some(file.to_owned()),
            _ => None,
        };

        LogEntry {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            level: meta.level().as_str(),
            service: self.service.clone(),
            pid: self.pid,
            target: meta.target().to_owned(),
            message: collected.message,
            fields: collected.fields,
            spans,
            location,
        }
    }
}

impl<S, W> Layer<S> for JsonLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let entry = self.entry(event, &ctx);
        let Ok(mut line) = serde_json::to_vec(&entry) else {
            return;
        };
        line.push(b'\n');
        // Logging must never take the process down.
        let _ = self.make_writer.make_writer().write_all(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WriterFactory;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture(emit: impl FnOnce()) -> Value {
        let buf = SharedBuf::default();
        let layer = JsonLayer::new("session".to_string(), WriterFactory::new(buf.clone()));
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, emit);

        let bytes = buf.0.lock().clone();
        let line = String::from_utf8(bytes).unwrap();
        serde_json::from_str(line.trim()).unwrap()
    }

    #[test]
    fn test_entry_fields() {
        let entry = capture(|| tracing::info!(status = 401u64, retry = true, "request failed"));
        assert_eq!(entry["service"], "session");
        assert_eq!(entry["level"], "INFO");
        assert_eq!(entry["message"], "request failed");
        assert_eq!(entry["fields"]["status"], 401);
        assert_eq!(entry["fields"]["retry"], true);
        assert!(entry["location"].as_str().unwrap().contains("json_layer.rs:"));
    }

    #[test]
    fn test_spans_are_listed_outermost_first() {
        let entry = capture(|| {
            let outer = tracing::info_span!("refresh");
            let _outer = outer.enter();
            let inner = tracing::info_span!("replay");
            let _inner = inner.enter();
            tracing::debug!("queued request replayed");
        });
        assert_eq!(entry["spans"], serde_json::json!(["refresh", "replay"]));
    }

    #[test]
    fn test_sensitive_fields_are_redacted() {
        let entry = capture(|| {
            tracing::warn!(
                access_token = "eyJhbGciOi",
                refresh_token = %"r-1",
                authorization = "Bearer eyJ",
                path = "/me",
                "refresh"
            )
        });
        assert_eq!(entry["fields"]["access_token"], REDACTED);
        assert_eq!(entry["fields"]["refresh_token"], REDACTED);
        assert_eq!(entry["fields"]["authorization"], REDACTED);
        assert_eq!(entry["fields"]["path"], "/me");
    }

    #[test]
    fn test_is_sensitive_field() {
        assert!(is_sensitive_field("Set-Cookie"));
        assert!(is_sensitive_field("password"));
        assert!(!is_sensitive_field("status"));
    }
}
