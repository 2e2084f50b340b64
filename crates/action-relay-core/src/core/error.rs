// crates/action-relay-core/src/core/error.rs
// ============================================================================
// Module: Dispatch Errors
// Description: Error taxonomy for action and dialog dispatch.
// Purpose: Classify failures precisely for callers, audit events, and status codes.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`DispatchError`] is the single error type returned by interaction
//! operations. Each variant exposes a stable [`DispatchError::kind`] label for
//! audit records and a [`DispatchError::status_code`] for outer HTTP layers.
//! Security posture: error messages never echo response bodies.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::envelope::CodecError;
use crate::core::target::ResolveError;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Action and dialog dispatch failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Resolution and policy failures are reported before any network I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Action URL could not be resolved or parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// Destination URL has no usable scheme.
    #[error("missing protocol scheme: {0}")]
    MissingScheme(String),
    /// Destination URL uses a scheme other than http or https.
    #[error("unsupported protocol scheme: {0}")]
    UnsupportedScheme(String),
    /// Destination resolves to an internal address that is not allow-listed.
    #[error("address forbidden, you may need to allow it: {host}")]
    ForbiddenAddress {
        /// Destination host.
        host: String,
    },
    /// Deadline expired before the callback completed.
    #[error("callback timed out after {timeout_ms}ms")]
    Timeout {
        /// Deadline in milliseconds.
        timeout_ms: u64,
    },
    /// DNS failure, connection refused, reset, or transport error.
    #[error("connection error: {0}")]
    ConnectionError(String),
    /// Action id did not match any action on the post.
    #[error("action not found: {0}")]
    ActionNotFound(String),
    /// Post id did not match any stored post.
    #[error("post not found: {0}")]
    PostNotFound(String),
    /// Plugin id did not match any active plugin.
    #[error("plugin not found: {0}")]
    PluginNotFound(String),
    /// Callback returned a body that is not a valid envelope.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// Callback returned a non-success HTTP status.
    #[error("integration returned status {status}")]
    IntegrationStatus {
        /// HTTP status code.
        status: u16,
    },
    /// Callback response exceeded the size limit.
    #[error("response exceeds {max_bytes} bytes")]
    ResponseTooLarge {
        /// Configured limit.
        max_bytes: usize,
    },
    /// Caller cancelled the dispatch.
    #[error("dispatch cancelled")]
    Cancelled,
    /// Post store failure.
    #[error("store failure: {0}")]
    Store(String),
    /// Trigger token validation failure.
    #[error("trigger failure: {0}")]
    Trigger(String),
    /// Envelope encoding or other internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// Returns a stable label for audit records.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid_url",
            Self::MissingScheme(_) => "missing_scheme",
            Self::UnsupportedScheme(_) => "unsupported_scheme",
            Self::ForbiddenAddress {
                ..
            } => "forbidden_address",
            Self::Timeout {
                ..
            } => "timeout",
            Self::ConnectionError(_) => "connection_error",
            Self::ActionNotFound(_) => "action_not_found",
            Self::PostNotFound(_) => "post_not_found",
            Self::PluginNotFound(_) => "plugin_not_found",
            Self::MalformedResponse(_) => "malformed_response",
            Self::IntegrationStatus {
                ..
            } => "integration_status",
            Self::ResponseTooLarge {
                ..
            } => "response_too_large",
            Self::Cancelled => "cancelled",
            Self::Store(_) => "store",
            Self::Trigger(_) => "trigger",
            Self::Internal(_) => "internal",
        }
    }

    /// Returns the HTTP status code an outer layer should report.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::ActionNotFound(_) | Self::PostNotFound(_) | Self::PluginNotFound(_) => 404,
            Self::InvalidUrl(_) | Self::MissingScheme(_) | Self::UnsupportedScheme(_) => 400,
            Self::ForbiddenAddress {
                ..
            }
            | Self::Trigger(_) => 403,
            Self::Timeout {
                ..
            } => 504,
            Self::ConnectionError(_)
            | Self::MalformedResponse(_)
            | Self::IntegrationStatus {
                ..
            }
            | Self::ResponseTooLarge {
                ..
            } => 502,
            Self::Cancelled => 499,
            Self::Store(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true when the failure occurred before any network I/O.
    #[must_use]
    pub const fn is_pre_flight(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl(_)
                | Self::MissingScheme(_)
                | Self::UnsupportedScheme(_)
                | Self::ForbiddenAddress { .. }
        )
    }
}

impl From<ResolveError> for DispatchError {
    fn from(err: ResolveError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<CodecError> for DispatchError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Encode(message) => Self::Internal(message),
            CodecError::Malformed(message) => Self::MalformedResponse(message),
        }
    }
}

impl From<StoreError> for DispatchError {
    fn from(err: StoreError) -> Self {
        Self::Store(err.to_string())
    }
}
