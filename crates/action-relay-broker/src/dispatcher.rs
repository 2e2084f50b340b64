// crates/action-relay-broker/src/dispatcher.rs
// ============================================================================
// Module: Action Dispatcher
// Description: Deadline-bounded, cancellable execution of resolved targets.
// Purpose: Classify callback outcomes once for every execution strategy.
// Dependencies: action-relay-core, tokio, tokio-util, tracing, url
// ============================================================================

//! ## Overview
//! [`ActionDispatcher::dispatch`] selects the executor for a
//! [`ResolvedTarget`], races it against the deadline and the caller's
//! [`CancellationToken`], and classifies the result. Expired deadlines and
//! cancellations drop the in-flight future, aborting any open connection.
//! Invariants:
//! - Each dispatch emits exactly one audit event.
//! - Non-2xx statuses fail with [`DispatchError::IntegrationStatus`].
//! - The deadline is never shorter than [`MIN_DISPATCH_TIMEOUT`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use action_relay_core::DispatchError;
use action_relay_core::DispatchSettings;
use action_relay_core::PluginBridge;
use action_relay_core::ResolvedTarget;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;
use url::Url;

use crate::audit::DispatchAuditEvent;
use crate::audit::DispatchAuditEventParams;
use crate::audit::DispatchAuditSink;
use crate::audit::NoopAuditSink;
use crate::executor::Executor;
use crate::executor::OutboundCall;
use crate::executor::RawResponse;
use crate::executor::http::HttpExecutor;
use crate::executor::plugin::PluginExecutor;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Shortest deadline applied to any dispatch.
pub const MIN_DISPATCH_TIMEOUT: Duration = Duration::from_secs(1);

// ============================================================================
// SECTION: Dispatcher
// ============================================================================

/// Executes resolved action targets under a deadline.
#[derive(Clone)]
pub struct ActionDispatcher {
    /// Executor for network targets.
    network: Arc<dyn Executor>,
    /// Executor for plugin-local targets.
    plugin: Arc<dyn Executor>,
    /// Audit sink for dispatch events.
    audit: Arc<dyn DispatchAuditSink>,
}

impl ActionDispatcher {
    /// Creates a dispatcher using the HTTP executor and the given plugin bridge.
    #[must_use]
    pub fn new(bridge: Arc<dyn PluginBridge>) -> Self {
        Self::with_executors(Arc::new(HttpExecutor::new()), Arc::new(PluginExecutor::new(bridge)))
    }

    /// Creates a dispatcher with explicit executors.
    #[must_use]
    pub fn with_executors(network: Arc<dyn Executor>, plugin: Arc<dyn Executor>) -> Self {
        Self {
            network,
            plugin,
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn DispatchAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Executes a callback against the target.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Timeout`] when the deadline expires,
    /// [`DispatchError::Cancelled`] when the caller cancels,
    /// [`DispatchError::IntegrationStatus`] for non-2xx responses, and any
    /// executor failure unchanged.
    pub async fn dispatch(
        &self,
        target: &ResolvedTarget,
        call: &OutboundCall,
        settings: &DispatchSettings,
        cancel: &CancellationToken,
    ) -> Result<RawResponse, DispatchError> {
        let started = Instant::now();
        let deadline = settings.timeout.max(MIN_DISPATCH_TIMEOUT);
        let executor = match target {
            ResolvedTarget::PluginLocal(_) => &self.plugin,
            ResolvedTarget::Network(_) => &self.network,
        };

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(DispatchError::Cancelled),
            outcome = tokio::time::timeout(deadline, executor.execute(target, call, settings)) => {
                outcome.unwrap_or_else(|_| {
                    Err(DispatchError::Timeout {
                        timeout_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                    })
                })
            }
        };
        let result = result.and_then(|response| {
            if response.is_success() {
                Ok(response)
            } else {
                Err(DispatchError::IntegrationStatus {
                    status: response.status,
                })
            }
        });

        self.record(target, &result, started);
        result
    }

    /// Emits the audit event and diagnostics for a finished dispatch.
    fn record(
        &self,
        target: &ResolvedTarget,
        result: &Result<RawResponse, DispatchError>,
        started: Instant,
    ) {
        let (plugin_id, host) = match target {
            ResolvedTarget::PluginLocal(route) => (Some(route.plugin_id().to_string()), None),
            ResolvedTarget::Network(network) => (
                None,
                Url::parse(network.as_str())
                    .ok()
                    .and_then(|url| url.host_str().map(str::to_string)),
            ),
        };
        let latency_ms = started.elapsed().as_millis();
        let (error_kind, status, response_bytes) = match result {
            Ok(response) => (None, Some(response.status), response.body.len()),
            Err(err) => {
                let status = match err {
                    DispatchError::IntegrationStatus {
                        status,
                    } => Some(*status),
                    _ => None,
                };
                if err.is_pre_flight() {
                    debug!(target_kind = target.kind(), error = %err, "dispatch refused");
                } else {
                    warn!(target_kind = target.kind(), error = %err, "dispatch failed");
                }
                (Some(err.kind()), status, 0)
            }
        };
        debug!(
            target_kind = target.kind(),
            plugin_id = plugin_id.as_deref().unwrap_or_default(),
            host = host.as_deref().unwrap_or_default(),
            latency_ms = u64::try_from(latency_ms).unwrap_or(u64::MAX),
            "dispatch finished"
        );
        self.audit.record(&DispatchAuditEvent::new(DispatchAuditEventParams {
            target_kind: target.kind(),
            plugin_id,
            host,
            error_kind,
            status,
            latency_ms,
            response_bytes,
        }));
    }
}
