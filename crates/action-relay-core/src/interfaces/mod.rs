// crates/action-relay-core/src/interfaces/mod.rs
// ============================================================================
// Module: Action Relay Interfaces
// Description: Collaborator interfaces for posts, plugins, and sessions.
// Purpose: Define the contract surfaces the dispatcher depends on.
// Dependencies: async-trait, crate::core
// ============================================================================

//! ## Overview
//! Interfaces decouple the dispatcher from the host system: durable post
//! storage, the in-process plugin HTTP bridge, session cookie lookup, and the
//! source of per-dispatch settings snapshots.
//! Implementations must be `Send + Sync`; dispatches call them concurrently.
//!
//! Security posture: plugin responses are untrusted and are decoded with the
//! same limits as network responses.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::identifiers::PluginId;
use crate::core::identifiers::PostId;
use crate::core::identifiers::UserId;
use crate::core::post::Post;
use crate::core::settings::DispatchSettings;

// ============================================================================
// SECTION: Post Store
// ============================================================================

/// Post store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("post store io error: {0}")]
    Io(String),
    /// Post to update does not exist.
    #[error("post store missing post: {0}")]
    Missing(String),
    /// Store reported an error.
    #[error("post store error: {0}")]
    Store(String),
}

/// Durable post storage.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Loads a post by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    async fn get_by_id(&self, post_id: &PostId) -> Result<Option<Post>, StoreError>;

    /// Persists an updated post and returns the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when persisting fails.
    async fn update(&self, post: Post) -> Result<Post, StoreError>;
}

// ============================================================================
// SECTION: Plugin Bridge
// ============================================================================

/// In-process HTTP request delivered to a plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRequest {
    /// HTTP method.
    pub method: String,
    /// Target plugin.
    pub plugin_id: PluginId,
    /// Path within the plugin, starting with `/`.
    pub path: String,
    /// Query parameters in order; keys may repeat.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Vec<u8>,
}

impl PluginRequest {
    /// Returns every value of a query parameter in order.
    #[must_use]
    pub fn query_values(&self, key: &str) -> Vec<&str> {
        self.query.iter().filter(|(name, _)| name == key).map(|(_, value)| value.as_str()).collect()
    }

    /// Returns the first value of a header, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Plugin HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl PluginResponse {
    /// Builds a 200 response with the given body.
    #[must_use]
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

/// Plugin bridge failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginBridgeError {
    /// No active plugin has the requested identifier.
    #[error("plugin not found: {0}")]
    NotFound(String),
    /// Plugin handler failed.
    #[error("plugin failure: {0}")]
    Failed(String),
}

/// In-process plugin HTTP bridge.
#[async_trait]
pub trait PluginBridge: Send + Sync {
    /// Delivers a request to a plugin's HTTP handler.
    ///
    /// # Errors
    ///
    /// Returns [`PluginBridgeError`] when the plugin is missing or fails.
    async fn dispatch(&self, request: PluginRequest) -> Result<PluginResponse, PluginBridgeError>;
}

// ============================================================================
// SECTION: Session Cookies
// ============================================================================

/// Session cookie lookup for the acting user.
pub trait SessionCookies: Send + Sync {
    /// Returns the `Cookie` header value for the user, if any.
    fn cookie_for(&self, user_id: &UserId) -> Option<String>;
}

/// Session cookie lookup that never returns a cookie.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSessionCookies;

impl SessionCookies for NoSessionCookies {
    fn cookie_for(&self, _user_id: &UserId) -> Option<String> {
        None
    }
}

// ============================================================================
// SECTION: Settings Source
// ============================================================================

/// Source of immutable per-dispatch settings snapshots.
pub trait SettingsSource: Send + Sync {
    /// Returns the current settings snapshot.
    fn snapshot(&self) -> Arc<DispatchSettings>;
}

impl SettingsSource for Arc<DispatchSettings> {
    fn snapshot(&self) -> Arc<DispatchSettings> {
        Arc::clone(self)
    }
}
