// crates/action-relay-core/src/core/target.rs
// ============================================================================
// Module: Action URL Resolution
// Description: Classifies raw action URLs into plugin-local or network targets.
// Purpose: Decide how a callback executes before any I/O is attempted.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`resolve_action_url`] turns an untrusted action URL plus the current site
//! URL into a [`ResolvedTarget`]. Plugin paths (`plugins/<id>/...`) execute
//! in-process regardless of leading or duplicate slashes. Dot segments are
//! folded before the plugin prefix is matched, so a path can never climb out
//! of `plugins/<id>` into the host's own routes. Anything carrying a scheme
//! marker is passed through untouched for the executor to validate;
//! other relative paths are anchored on the site URL.
//! Invariants:
//! - Resolution is pure; the same inputs always yield the same target.
//! - Targets are never cached because the site URL may change between calls.
//! - Scheme validity is not checked here; executors report it at run time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::PluginId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted action URL length in bytes.
pub const MAX_ACTION_URL_BYTES: usize = 8 * 1024;

/// Leading path segment routing a request to an in-process plugin.
const PLUGIN_SEGMENT: &str = "plugins";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Execution target for a single dispatch attempt.
///
/// # Invariants
/// - Immutable once produced; consumed by exactly one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    /// In-process plugin handler; never leaves the process.
    PluginLocal(PluginRoute),
    /// External HTTP destination subject to the network policy guard.
    Network(NetworkTarget),
}

impl ResolvedTarget {
    /// Returns a stable label for the target kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PluginLocal(_) => "plugin",
            Self::Network(_) => "network",
        }
    }
}

/// Route to an in-process plugin HTTP handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRoute {
    /// Target plugin identifier.
    plugin_id: PluginId,
    /// Path within the plugin, always starting with `/`.
    path: String,
    /// Raw query string embedded in the action URL (without `?`).
    query: String,
}

impl PluginRoute {
    /// Returns the plugin identifier.
    #[must_use]
    pub const fn plugin_id(&self) -> &PluginId {
        &self.plugin_id
    }

    /// Returns the path within the plugin.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw embedded query string.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// External destination URL.
///
/// # Invariants
/// - The URL is absolute in intent but may be syntactically invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkTarget {
    /// Destination URL as resolved.
    url: String,
}

impl NetworkTarget {
    /// Returns the destination URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

/// Action URL resolution failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Action URL was empty.
    #[error("action url is empty")]
    Empty,
    /// Action URL exceeded the size limit.
    #[error("action url exceeds {MAX_ACTION_URL_BYTES} bytes")]
    TooLong,
    /// Relative path could not be anchored.
    #[error("cannot resolve relative path without a site url")]
    MissingSiteUrl,
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolves a raw action URL against the current site URL.
///
/// # Errors
///
/// Returns [`ResolveError`] when the URL is empty, too long, or relative with
/// no site URL configured.
pub fn resolve_action_url(raw: &str, site_url: &str) -> Result<ResolvedTarget, ResolveError> {
    if raw.trim().is_empty() {
        return Err(ResolveError::Empty);
    }
    if raw.len() > MAX_ACTION_URL_BYTES {
        return Err(ResolveError::TooLong);
    }
    let site_url = site_url.trim().trim_end_matches('/');

    if let Some(route) = plugin_route(raw, site_url) {
        return Ok(ResolvedTarget::PluginLocal(route));
    }
    if has_scheme_marker(raw) {
        return Ok(ResolvedTarget::Network(NetworkTarget {
            url: raw.to_string(),
        }));
    }
    if site_url.is_empty() {
        return Err(ResolveError::MissingSiteUrl);
    }
    let (path, query) = split_path_and_query(raw);
    let mut url = format!("{site_url}/{}", normalize_path(path));
    if !query.is_empty() {
        url.push('?');
        url.push_str(query);
    }
    Ok(ResolvedTarget::Network(NetworkTarget {
        url,
    }))
}

/// Returns the plugin route when the URL addresses an in-process plugin.
fn plugin_route(raw: &str, site_url: &str) -> Option<PluginRoute> {
    let relative = match strip_site_prefix(raw, site_url) {
        Some(rest) => rest,
        None if has_scheme_marker(raw) => return None,
        None => raw,
    };
    let (path, query) = split_path_and_query(relative);
    let normalized = normalize_path(path);
    let rest = normalized.strip_prefix(PLUGIN_SEGMENT)?;
    let rest = rest.strip_prefix('/')?;
    let (plugin_id, sub_path) = rest.split_once('/').unwrap_or((rest, ""));
    if plugin_id.is_empty() {
        return None;
    }
    Some(PluginRoute {
        plugin_id: PluginId::new(plugin_id),
        path: format!("/{sub_path}"),
        query: query.to_string(),
    })
}

/// Strips the configured site URL from the front of an action URL.
///
/// Only whole path segments match: `https://host/sub` does not strip from
/// `https://host/subway`.
fn strip_site_prefix<'a>(raw: &'a str, site_url: &str) -> Option<&'a str> {
    if site_url.is_empty() {
        return None;
    }
    let rest = raw.strip_prefix(site_url)?;
    if rest.is_empty() || rest.starts_with(['/', '?', '#']) {
        return Some(rest);
    }
    None
}

/// Returns true when the URL carries a scheme marker before its first path,
/// query, or fragment delimiter (for example `https:` or a bare `:`).
fn has_scheme_marker(raw: &str) -> bool {
    raw.split(['/', '?', '#']).next().unwrap_or_default().contains(':')
}

/// Splits a URL into its path and raw query, discarding any fragment.
fn split_path_and_query(raw: &str) -> (&str, &str) {
    let without_fragment = raw.split_once('#').map_or(raw, |(head, _)| head);
    without_fragment.split_once('?').unwrap_or((without_fragment, ""))
}

/// Collapses repeated slashes, folds `.` and `..` segments, and strips the
/// leading slash. `..` never climbs above the root; a trailing slash survives.
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    let mut normalized = segments.join("/");
    if !normalized.is_empty() && path.ends_with('/') {
        normalized.push('/');
    }
    normalized
}
