// crates/action-relay-broker/src/guard.rs
// ============================================================================
// Module: Network Policy Guard
// Description: DNS resolution and address policy for outbound destinations.
// Purpose: Refuse internal destinations before any socket is opened.
// Dependencies: action-relay-core, tokio, url
// ============================================================================

//! ## Overview
//! [`NetworkGuard::check`] resolves the destination host and compares every
//! answer against the reserved address ranges and the operator allow-list.
//! The approved answers are returned as a [`PinnedDestination`] so the HTTP
//! client connects only to addresses that passed the check.
//! Invariants:
//! - Any internal, non-allow-listed answer forbids the whole destination.
//! - URLs carrying credentials are rejected.
//! - Pinned addresses are unique and non-empty.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::IpAddr;
use std::net::SocketAddr;

use action_relay_core::AllowList;
use action_relay_core::DispatchError;
use action_relay_core::is_internal_address;
use tracing::debug;
use url::Host;
use url::Url;

// ============================================================================
// SECTION: Pinned Destination
// ============================================================================

/// Destination approved by the guard with its pinned addresses.
///
/// # Invariants
/// - `ips` is non-empty and contains unique entries.
/// - `port` is the effective request port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedDestination {
    /// Normalized host label used for policy and reporting.
    host_label: String,
    /// Host as parsed from the URL.
    host: Host<String>,
    /// Effective port.
    port: u16,
    /// Approved addresses.
    ips: Vec<IpAddr>,
}

impl PinnedDestination {
    /// Returns the normalized host label.
    #[must_use]
    pub fn host_label(&self) -> &str {
        &self.host_label
    }

    /// Returns the domain name when the host is not an address literal.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        match &self.host {
            Host::Domain(domain) => Some(domain.as_str()),
            Host::Ipv4(_) | Host::Ipv6(_) => None,
        }
    }

    /// Returns the approved socket addresses.
    #[must_use]
    pub fn socket_addrs(&self) -> Vec<SocketAddr> {
        self.ips.iter().map(|ip| SocketAddr::new(*ip, self.port)).collect()
    }

    /// Returns the approved addresses.
    #[must_use]
    pub fn ips(&self) -> &[IpAddr] {
        &self.ips
    }
}

// ============================================================================
// SECTION: Guard
// ============================================================================

/// Network policy guard for outbound destinations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkGuard;

impl NetworkGuard {
    /// Resolves and validates a destination URL against the allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidUrl`] for credentials or missing hosts,
    /// [`DispatchError::ConnectionError`] when DNS resolution fails, and
    /// [`DispatchError::ForbiddenAddress`] when an internal address is not
    /// allow-listed.
    pub async fn check(url: &Url, allow_list: &AllowList) -> Result<PinnedDestination, DispatchError> {
        if !url.username().is_empty() || url.password().is_some() {
            return Err(DispatchError::InvalidUrl("credentials are not permitted".to_string()));
        }
        let host = url
            .host()
            .ok_or_else(|| DispatchError::InvalidUrl("missing host".to_string()))?;
        let host_label = normalize_host_label(&host);
        let port = url
            .port_or_known_default()
            .ok_or_else(|| DispatchError::InvalidUrl("missing port".to_string()))?;

        let mut ips = resolve_host_ips(&host, port).await?;
        dedupe_ips(&mut ips);
        if ips.is_empty() {
            return Err(DispatchError::ConnectionError(format!(
                "host has no resolved addresses: {host_label}"
            )));
        }
        for ip in &ips {
            if is_internal_address(*ip) && !allow_list.permits(&host_label, *ip) {
                debug!(host = %host_label, ip = %ip, "refusing internal destination");
                return Err(DispatchError::ForbiddenAddress {
                    host: host_label,
                });
            }
        }
        Ok(PinnedDestination {
            host_label,
            host: owned_host(&host),
            port,
            ips,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Normalizes a host into a lowercase label.
fn normalize_host_label(host: &Host<&str>) -> String {
    match host {
        Host::Domain(domain) => domain.trim_end_matches('.').to_ascii_lowercase(),
        Host::Ipv4(ip) => ip.to_string(),
        Host::Ipv6(ip) => ip.to_string(),
    }
}

/// Resolves a host to its addresses.
async fn resolve_host_ips(host: &Host<&str>, port: u16) -> Result<Vec<IpAddr>, DispatchError> {
    match host {
        Host::Ipv4(ip) => Ok(vec![IpAddr::V4(*ip)]),
        Host::Ipv6(ip) => Ok(vec![IpAddr::V6(*ip)]),
        Host::Domain(domain) => tokio::net::lookup_host((*domain, port))
            .await
            .map(|addrs| addrs.map(|addr| addr.ip()).collect())
            .map_err(|err| DispatchError::ConnectionError(format!("dns lookup failed: {err}"))),
    }
}

/// Converts a borrowed host into an owned host.
fn owned_host(host: &Host<&str>) -> Host<String> {
    match host {
        Host::Domain(domain) => Host::Domain((*domain).to_string()),
        Host::Ipv4(ip) => Host::Ipv4(*ip),
        Host::Ipv6(ip) => Host::Ipv6(*ip),
    }
}

/// Removes duplicate addresses while preserving order.
fn dedupe_ips(ips: &mut Vec<IpAddr>) {
    let mut unique = Vec::with_capacity(ips.len());
    for ip in ips.drain(..) {
        if !unique.contains(&ip) {
            unique.push(ip);
        }
    }
    *ips = unique;
}
