// crates/action-relay-broker/src/audit.rs
// ============================================================================
// Module: Dispatch Audit Logging
// Description: Structured audit events for callback dispatches.
// Purpose: Record one redacted event per dispatch without hard dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every dispatch produces one [`DispatchAuditEvent`] describing the target,
//! the outcome, and its latency. Events never contain envelopes, cookies, or
//! response bodies. Sinks are pluggable so deployments can route events to
//! their preferred logging pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Dispatch audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Target kind label (`plugin` or `network`).
    pub target_kind: &'static str,
    /// Plugin identifier for plugin targets.
    pub plugin_id: Option<String>,
    /// Destination host for network targets.
    pub host: Option<String>,
    /// Outcome label (`success` or `failure`).
    pub outcome: &'static str,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Callback HTTP status when a response was received.
    pub status: Option<u16>,
    /// Elapsed time in milliseconds.
    pub latency_ms: u128,
    /// Response body size in bytes.
    pub response_bytes: usize,
}

/// Inputs required to construct a dispatch audit event.
pub struct DispatchAuditEventParams {
    /// Target kind label.
    pub target_kind: &'static str,
    /// Plugin identifier for plugin targets.
    pub plugin_id: Option<String>,
    /// Destination host for network targets.
    pub host: Option<String>,
    /// Normalized error kind label, `None` on success.
    pub error_kind: Option<&'static str>,
    /// Callback HTTP status when a response was received.
    pub status: Option<u16>,
    /// Elapsed time in milliseconds.
    pub latency_ms: u128,
    /// Response body size in bytes.
    pub response_bytes: usize,
}

impl DispatchAuditEvent {
    /// Builds an audit event stamped with the current time.
    #[must_use]
    pub fn new(params: DispatchAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "action_dispatch",
            timestamp_ms,
            target_kind: params.target_kind,
            plugin_id: params.plugin_id,
            host: params.host,
            outcome: if params.error_kind.is_none() { "success" } else { "failure" },
            error_kind: params.error_kind,
            status: params.status,
            latency_ms: params.latency_ms,
            response_bytes: params.response_bytes,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for dispatch events.
pub trait DispatchAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &DispatchAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl DispatchAuditSink for StderrAuditSink {
    fn record(&self, event: &DispatchAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl DispatchAuditSink for FileAuditSink {
    fn record(&self, event: &DispatchAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl DispatchAuditSink for NoopAuditSink {
    fn record(&self, _event: &DispatchAuditEvent) {}
}
