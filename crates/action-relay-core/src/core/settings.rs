// crates/action-relay-core/src/core/settings.rs
// ============================================================================
// Module: Dispatch Settings
// Description: Immutable settings snapshot consumed by a single dispatch.
// Purpose: Keep concurrent dispatches isolated from configuration reloads.
// Dependencies: crate::core::network
// ============================================================================

//! ## Overview
//! A [`DispatchSettings`] value is taken once at the start of a dispatch and
//! passed explicitly through resolution, policy, and execution. Reloads build
//! a new snapshot; they never mutate one already in use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use crate::core::network::AllowList;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default outbound deadline in seconds.
pub const DEFAULT_OUTGOING_TIMEOUT_SECS: u64 = 30;

/// Default maximum callback response size in bytes.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Settings snapshot for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Site URL used to anchor relative action URLs; may be empty.
    pub site_url: String,
    /// Trusted internal destinations.
    pub allow_list: AllowList,
    /// Outbound deadline.
    pub timeout: Duration,
    /// Maximum accepted response body size.
    pub max_response_bytes: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            site_url: String::new(),
            allow_list: AllowList::default(),
            timeout: Duration::from_secs(DEFAULT_OUTGOING_TIMEOUT_SECS),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

impl DispatchSettings {
    /// Returns settings anchored on the given site URL with defaults elsewhere.
    #[must_use]
    pub fn with_site_url(site_url: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
            ..Self::default()
        }
    }
}

/// Converts a configured timeout in seconds into the effective deadline.
///
/// Absent or non-positive values fall back to the default.
#[must_use]
pub fn effective_timeout(seconds: Option<i64>) -> Duration {
    match seconds.and_then(|value| u64::try_from(value).ok()) {
        Some(value) if value > 0 => Duration::from_secs(value),
        _ => Duration::from_secs(DEFAULT_OUTGOING_TIMEOUT_SECS),
    }
}
