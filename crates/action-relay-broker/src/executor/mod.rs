// crates/action-relay-broker/src/executor/mod.rs
// ============================================================================
// Module: Callback Executors
// Description: Execution strategies for resolved action targets.
// Purpose: Put plugin-local and networked execution behind one interface.
// Dependencies: action-relay-core, async-trait
// ============================================================================

//! ## Overview
//! An [`Executor`] performs one callback for a [`ResolvedTarget`] and returns
//! the raw status and body. Deadlines, cancellation, status classification,
//! and auditing live in the dispatcher so they are written once.

// ============================================================================
// SECTION: Imports
// ============================================================================

use action_relay_core::DispatchError;
use action_relay_core::DispatchSettings;
use action_relay_core::ResolvedTarget;
use async_trait::async_trait;

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod http;
pub mod plugin;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Content type sent with every callback body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Outbound callback payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundCall {
    /// Serialized envelope.
    pub body: Vec<u8>,
    /// `Cookie` header value forwarded to the destination.
    pub cookie: Option<String>,
    /// Explicit query parameters appended after embedded ones (plugin only).
    pub query: Vec<(String, String)>,
}

impl OutboundCall {
    /// Creates a call with the given body.
    #[must_use]
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            body,
            ..Self::default()
        }
    }

    /// Sets the forwarded cookie.
    #[must_use]
    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie.filter(|value| !value.is_empty());
        self
    }
}

/// Raw callback response before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, bounded by the configured maximum.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Callback execution strategy.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Executes a callback against the target.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the target cannot be reached or the
    /// response exceeds the configured limit.
    async fn execute(
        &self,
        target: &ResolvedTarget,
        call: &OutboundCall,
        settings: &DispatchSettings,
    ) -> Result<RawResponse, DispatchError>;
}

/// Fails when a response body would exceed the configured limit.
pub(crate) const fn enforce_max_bytes(actual: usize, max_bytes: usize) -> Result<(), DispatchError> {
    if actual > max_bytes {
        return Err(DispatchError::ResponseTooLarge {
            max_bytes,
        });
    }
    Ok(())
}
