//! Telemetry Bridge
//!
//! Optional export of structured telemetry events to an external monitoring
//! backend, configured once at startup from a connection string and frozen
//! for the process lifetime.
//!
//! The domain-facing abstraction is the [`TelemetrySink`] port. Production
//! runs use [`OtlpSink`], which forwards events as spans over OTLP/HTTP.
//! When no credential is configured, or exporter construction fails, the
//! process falls back to [`NoopSink`] and keeps serving — telemetry is
//! never a startup hard-failure.
//!
//! [`RecordingSink`] is an in-memory double for asserting on emitted events
//! in tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use opentelemetry::trace::{Span as _, Status, Tracer as _, TracerProvider as _};
use opentelemetry::KeyValue;
use opentelemetry_otlp::{WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::trace as sdktrace;
use opentelemetry_sdk::Resource;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{Error, Result};

/// Service name attached to every exported span.
const SERVICE_NAME: &str = "crashprobe";

/// Header carrying the credential key to the ingestion endpoint.
const API_KEY_HEADER: &str = "x-api-key";

/// Timeout for a single export batch.
const EXPORT_TIMEOUT: Duration = Duration::from_secs(10);

/// First trace shipped through the sink once the exporter is up; confirms
/// the log path works end-to-end before any crash is triggered.
const STARTUP_TRACE: &str = "Telemetry log handler initialized.";

// =============================================================================
// Events and the Sink Port
// =============================================================================

/// Severity of a tracked trace event.
///
/// Covers exactly the severities this application emits: the startup
/// announcement and the crash marker. `tracing` tops out at ERROR, so the
/// crash marker travels through the sink as `Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Information,
    Critical,
}

impl Severity {
    /// Stable string form used as a span attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Information => "information",
            Severity::Critical => "critical",
        }
    }
}

/// Telemetry sink port.
///
/// The HTTP surface and the fault trigger report through this trait; the
/// adapter behind it decides whether events leave the process.
pub trait TelemetrySink: Send + Sync {
    /// Record a standalone trace (log) event.
    fn track_trace(&self, severity: Severity, message: &str);

    /// Record an exception event.
    fn track_exception(&self, kind: &str, message: &str);

    /// Record a completed HTTP request.
    fn track_request(&self, method: &str, path: &str, status: u16);

    /// Flush buffered events and release exporter resources.
    ///
    /// No-op for sinks that perform no I/O.
    fn shutdown(&self) {}
}

// =============================================================================
// Connection String
// =============================================================================

/// Parsed telemetry connection credential.
///
/// The wire form is a semicolon-separated list of `Key=Value` pairs, e.g.
/// `IngestionEndpoint=https://otlp.example.com;InstrumentationKey=abc123`.
/// The endpoint is mandatory; the key is optional and travels as a request
/// header. Unknown pairs are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    /// Base URL of the ingestion endpoint.
    pub endpoint: String,
    /// Optional credential forwarded with every export request.
    pub instrumentation_key: Option<String>,
}

impl ConnectionString {
    /// Parse a raw connection string.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut endpoint = None;
        let mut instrumentation_key = None;
        let mut pairs = 0;

        for segment in raw.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                Error::InvalidConnectionString(format!("segment '{segment}' is not Key=Value"))
            })?;
            let (key, value) = (key.trim(), value.trim());
            if value.is_empty() {
                return Err(Error::InvalidConnectionString(format!(
                    "segment '{key}' has an empty value"
                )));
            }
            pairs += 1;

            match key.to_ascii_lowercase().as_str() {
                "ingestionendpoint" | "endpoint" => endpoint = Some(value.to_string()),
                "instrumentationkey" => instrumentation_key = Some(value.to_string()),
                _ => {} // forward compatibility
            }
        }

        if pairs == 0 {
            return Err(Error::InvalidConnectionString(
                "no Key=Value segments found".to_string(),
            ));
        }

        let endpoint = endpoint.ok_or_else(|| {
            Error::InvalidConnectionString("missing IngestionEndpoint".to_string())
        })?;
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(Error::InvalidConnectionString(format!(
                "endpoint '{endpoint}' must be http(s)"
            )));
        }

        Ok(Self {
            endpoint,
            instrumentation_key,
        })
    }

    /// Full URL of the OTLP traces resource on the ingestion endpoint.
    pub fn traces_url(&self) -> String {
        format!("{}/v1/traces", self.endpoint.trim_end_matches('/'))
    }
}

// =============================================================================
// Sink Adapters
// =============================================================================

/// Sink used when telemetry is disabled; drops every event.
#[derive(Debug, Default)]
pub struct NoopSink;

impl TelemetrySink for NoopSink {
    fn track_trace(&self, _severity: Severity, _message: &str) {}
    fn track_exception(&self, _kind: &str, _message: &str) {}
    fn track_request(&self, _method: &str, _path: &str, _status: u16) {}
}

/// OTLP/HTTP-backed sink.
///
/// Each tracked event becomes one span, batch-exported in the background by
/// the OpenTelemetry SDK. Exception and request conventions follow the
/// OpenTelemetry semantic attribute names.
pub struct OtlpSink {
    provider: sdktrace::TracerProvider,
    tracer: sdktrace::Tracer,
}

impl OtlpSink {
    /// Build an exporter bound to the parsed connection credential.
    ///
    /// Must be called from within a Tokio runtime; the batch processor
    /// spawns its export task there.
    pub fn new(conn: &ConnectionString) -> Result<Self> {
        let mut headers = HashMap::new();
        if let Some(key) = &conn.instrumentation_key {
            headers.insert(API_KEY_HEADER.to_string(), key.clone());
        }

        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_protocol(opentelemetry_otlp::Protocol::HttpBinary)
            .with_endpoint(conn.traces_url())
            .with_timeout(EXPORT_TIMEOUT)
            .with_headers(headers)
            .build()
            .map_err(|e| Error::TelemetryInit(e.to_string()))?;

        let provider = sdktrace::TracerProvider::builder()
            .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
            .with_resource(Resource::new([KeyValue::new("service.name", SERVICE_NAME)]))
            .build();
        let tracer = provider.tracer(SERVICE_NAME);

        Ok(Self { provider, tracer })
    }
}

impl std::fmt::Debug for OtlpSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtlpSink").finish_non_exhaustive()
    }
}

impl TelemetrySink for OtlpSink {
    fn track_trace(&self, severity: Severity, message: &str) {
        let mut span = self.tracer.start("trace");
        span.set_attribute(KeyValue::new("log.severity", severity.as_str()));
        span.set_attribute(KeyValue::new("log.message", message.to_string()));
        span.end();
    }

    fn track_exception(&self, kind: &str, message: &str) {
        let mut span = self.tracer.start("exception");
        span.add_event(
            "exception",
            vec![
                KeyValue::new("exception.type", kind.to_string()),
                KeyValue::new("exception.message", message.to_string()),
            ],
        );
        span.set_status(Status::error(message.to_string()));
        span.end();
    }

    fn track_request(&self, method: &str, path: &str, status: u16) {
        let mut span = self.tracer.start("request");
        span.set_attribute(KeyValue::new("http.request.method", method.to_string()));
        span.set_attribute(KeyValue::new("url.path", path.to_string()));
        span.set_attribute(KeyValue::new(
            "http.response.status_code",
            i64::from(status),
        ));
        if status >= 500 {
            span.set_status(Status::error("server error"));
        }
        span.end();
    }

    fn shutdown(&self) {
        if let Err(e) = self.provider.shutdown() {
            warn!("Telemetry exporter shutdown failed: {e}");
        }
    }
}

// =============================================================================
// Recording Sink (test double)
// =============================================================================

/// One event captured by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedEvent {
    Trace {
        severity: Severity,
        message: String,
    },
    Exception {
        kind: String,
        message: String,
    },
    Request {
        method: String,
        path: String,
        status: u16,
    },
}

/// In-memory sink for tests; records every event in arrival order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events recorded so far.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }
}

impl TelemetrySink for RecordingSink {
    fn track_trace(&self, severity: Severity, message: &str) {
        self.events.lock().push(RecordedEvent::Trace {
            severity,
            message: message.to_string(),
        });
    }

    fn track_exception(&self, kind: &str, message: &str) {
        self.events.lock().push(RecordedEvent::Exception {
            kind: kind.to_string(),
            message: message.to_string(),
        });
    }

    fn track_request(&self, method: &str, path: &str, status: u16) {
        self.events.lock().push(RecordedEvent::Request {
            method: method.to_string(),
            path: path.to_string(),
            status,
        });
    }
}

// =============================================================================
// Bootstrap
// =============================================================================

/// Handle to the telemetry state decided at startup.
pub struct Telemetry {
    sink: Arc<dyn TelemetrySink>,
    enabled: bool,
}

impl Telemetry {
    /// Telemetry switched off; all events are dropped.
    pub fn disabled() -> Self {
        Self {
            sink: Arc::new(NoopSink),
            enabled: false,
        }
    }

    /// Telemetry active. Announces the attachment through the sink itself
    /// so the log path is exercised once at startup.
    fn enabled(sink: Arc<dyn TelemetrySink>) -> Self {
        sink.track_trace(Severity::Information, STARTUP_TRACE);
        Self {
            sink,
            enabled: true,
        }
    }

    /// Whether an exporter was successfully constructed at startup.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Shared handle to the active sink.
    pub fn sink(&self) -> Arc<dyn TelemetrySink> {
        Arc::clone(&self.sink)
    }

    /// Flush and release the exporter, if any.
    pub fn shutdown(&self) {
        self.sink.shutdown();
    }
}

/// Initialize telemetry from the frozen startup configuration.
///
/// Exporter misconfiguration is deliberately non-fatal: a malformed
/// credential or failed construction logs a warning and the process keeps
/// serving without telemetry.
pub fn init(config: &AppConfig) -> Telemetry {
    let raw = match &config.telemetry_connection_string {
        Some(raw) => raw,
        None => {
            warn!("TELEMETRY_CONNECTION_STRING not set. Telemetry disabled.");
            return Telemetry::disabled();
        }
    };

    let conn = match ConnectionString::parse(raw) {
        Ok(conn) => conn,
        Err(e) => {
            warn!("Error initializing telemetry: {e}. Continuing without telemetry export.");
            return Telemetry::disabled();
        }
    };

    match OtlpSink::new(&conn) {
        Ok(sink) => {
            info!("Telemetry exporter initialized for {}", conn.endpoint);
            Telemetry::enabled(Arc::new(sink))
        }
        Err(e) => {
            warn!("Error initializing telemetry: {e}. Continuing without telemetry export.");
            Telemetry::disabled()
        }
    }
}
