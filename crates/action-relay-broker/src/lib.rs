// crates/action-relay-broker/src/lib.rs
// ============================================================================
// Module: Action Relay Broker Library
// Description: Guarded execution of interactive action callbacks.
// Purpose: Dispatch actions and dialogs to plugins or HTTP endpoints safely.
// Dependencies: action-relay-core, reqwest, tokio, dashmap
// ============================================================================

//! ## Overview
//! The broker executes resolved action targets. [`ActionDispatcher`] runs a
//! single callback under a deadline and a caller cancellation token, choosing
//! between the [`HttpExecutor`] (behind the [`NetworkGuard`]) and the
//! [`PluginExecutor`]. [`InteractionService`] ties the dispatcher to post
//! storage, the [`TriggerCorrelator`], and the post mutation rules.
//!
//! Security posture: destinations are untrusted; internal addresses are
//! refused unless allow-listed, DNS answers are pinned, and redirects are
//! never followed. See `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod dispatcher;
pub mod executor;
pub mod guard;
pub mod service;
pub mod trigger;


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::DispatchAuditEvent;
pub use audit::DispatchAuditEventParams;
pub use audit::DispatchAuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use dispatcher::ActionDispatcher;
pub use dispatcher::MIN_DISPATCH_TIMEOUT;
pub use executor::Executor;
pub use executor::OutboundCall;
pub use executor::RawResponse;
pub use executor::http::HttpExecutor;
pub use executor::plugin::PluginExecutor;
pub use executor::plugin::merge_query;
pub use guard::NetworkGuard;
pub use guard::PinnedDestination;
pub use service::ActionOutcome;
pub use service::InteractionService;
pub use service::PostActionRequest;
pub use trigger::DEFAULT_TRIGGER_MAX_ENTRIES;
pub use trigger::DEFAULT_TRIGGER_TTL;
pub use trigger::TRIGGER_TOKEN_LENGTH;
pub use trigger::TriggerBinding;
pub use trigger::TriggerCorrelator;
pub use trigger::TriggerError;
pub use trigger::TriggerSettings;
