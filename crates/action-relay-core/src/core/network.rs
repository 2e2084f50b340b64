// crates/action-relay-core/src/core/network.rs
// ============================================================================
// Module: Network Address Policy
// Description: Internal address classification and allow-list matching.
// Purpose: Provide the pure decisions behind outbound SSRF protection.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`is_internal_address`] classifies resolved destination addresses against
//! reserved IPv4 and IPv6 ranges. [`AllowList`] holds the operator's trusted
//! internal destinations as host names, address literals, or CIDR blocks.
//! Invariants:
//! - IPv4-mapped and NAT64 IPv6 addresses are classified by their IPv4 form.
//! - An empty allow-list permits no internal destination.
//! - Host matching is case-insensitive and ignores a trailing dot.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::net::Ipv6Addr;
use std::str::FromStr;

use thiserror::Error;

// ============================================================================
// SECTION: Reserved Ranges
// ============================================================================

/// Reserved IPv4 ranges treated as internal (network, prefix length).
const RESERVED_V4: [([u8; 4], u8); 14] = [
    ([0, 0, 0, 0], 8),
    ([10, 0, 0, 0], 8),
    ([100, 64, 0, 0], 10),
    ([127, 0, 0, 0], 8),
    ([169, 254, 0, 0], 16),
    ([172, 16, 0, 0], 12),
    ([192, 0, 0, 0], 24),
    ([192, 0, 2, 0], 24),
    ([192, 168, 0, 0], 16),
    ([198, 18, 0, 0], 15),
    ([198, 51, 100, 0], 24),
    ([203, 0, 113, 0], 24),
    ([224, 0, 0, 0], 4),
    ([240, 0, 0, 0], 4),
];

/// Reserved IPv6 ranges treated as internal (network, prefix length).
const RESERVED_V6: [(u128, u8); 6] = [
    (0, 127),
    (0xfc00_u128 << 112, 7),
    (0xfe80_u128 << 112, 10),
    (0xff00_u128 << 112, 8),
    (0x2001_0db8_u128 << 96, 32),
    (0x2002_u128 << 112, 16),
];

/// NAT64 well-known prefix `64:ff9b::/96`.
const NAT64_PREFIX: u128 = 0x0064_ff9b_u128 << 96;

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Returns true when the address is private, loopback, link-local, CGNAT,
/// unspecified, multicast, broadcast, documentation, or otherwise reserved.
#[must_use]
pub fn is_internal_address(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_internal_v4(v4),
        IpAddr::V6(v6) => is_internal_v6(v6),
    }
}

/// Classifies an IPv4 address.
fn is_internal_v4(ip: Ipv4Addr) -> bool {
    let value = u32::from(ip);
    RESERVED_V4.iter().any(|(network, prefix)| {
        prefix_matches_v4(value, u32::from(Ipv4Addr::from(*network)), *prefix)
    })
}

/// Classifies an IPv6 address.
fn is_internal_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_internal_v4(v4);
    }
    let value = u128::from(ip);
    if prefix_matches_v6(value, NAT64_PREFIX, 96) {
        return is_internal_v4(embedded_v4(value));
    }
    RESERVED_V6.iter().any(|(network, prefix)| prefix_matches_v6(value, *network, *prefix))
}

/// Extracts the IPv4 address embedded in the low 32 bits.
fn embedded_v4(value: u128) -> Ipv4Addr {
    let low = u32::try_from(value & u128::from(u32::MAX)).unwrap_or(u32::MAX);
    Ipv4Addr::from(low)
}

/// Returns true when `value` falls inside the IPv4 network.
fn prefix_matches_v4(value: u32, network: u32, prefix: u8) -> bool {
    let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - u32::from(prefix)) };
    value & mask == network & mask
}

/// Returns true when `value` falls inside the IPv6 network.
fn prefix_matches_v6(value: u128, network: u128, prefix: u8) -> bool {
    let mask = if prefix == 0 { 0 } else { u128::MAX << (128 - u32::from(prefix)) };
    value & mask == network & mask
}

// ============================================================================
// SECTION: CIDR Blocks
// ============================================================================

/// CIDR network block.
///
/// # Invariants
/// - `prefix` never exceeds the address width of `network`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CidrBlock {
    /// Network address.
    network: IpAddr,
    /// Prefix length in bits.
    prefix: u8,
}

impl CidrBlock {
    /// Returns the network address.
    #[must_use]
    pub const fn network(&self) -> IpAddr {
        self.network
    }

    /// Returns the prefix length.
    #[must_use]
    pub const fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Returns true when the block contains the address.
    #[must_use]
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.network, canonical(ip)) {
            (IpAddr::V4(network), IpAddr::V4(ip)) => {
                prefix_matches_v4(u32::from(ip), u32::from(network), self.prefix)
            }
            (IpAddr::V6(network), IpAddr::V6(ip)) => {
                prefix_matches_v6(u128::from(ip), u128::from(network), self.prefix)
            }
            _ => false,
        }
    }
}

impl FromStr for CidrBlock {
    type Err = AllowListError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || AllowListError::InvalidCidr(value.to_string());
        let (address, prefix) = value.split_once('/').ok_or_else(invalid)?;
        let network = canonical(IpAddr::from_str(address).map_err(|_| invalid())?);
        let prefix = prefix.parse::<u8>().map_err(|_| invalid())?;
        let width = match network {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix > width {
            return Err(invalid());
        }
        Ok(Self {
            network,
            prefix,
        })
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

/// Maps IPv4-mapped IPv6 addresses to their IPv4 form.
fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(ip, IpAddr::V4),
        IpAddr::V4(_) => ip,
    }
}

// ============================================================================
// SECTION: Allow List
// ============================================================================

/// Allow-list parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllowListError {
    /// Entry looked like a CIDR block but did not parse.
    #[error("invalid cidr block: {0}")]
    InvalidCidr(String),
    /// Entry was not a usable host name.
    #[error("invalid allow-list host: {0}")]
    InvalidHost(String),
}

/// Single trusted internal destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowRule {
    /// Normalized host name.
    Host(String),
    /// Address literal.
    Address(IpAddr),
    /// Network block.
    Cidr(CidrBlock),
}

impl AllowRule {
    /// Parses one allow-list entry.
    ///
    /// # Errors
    ///
    /// Returns [`AllowListError`] when the entry is not a host, address, or
    /// CIDR block.
    pub fn parse(entry: &str) -> Result<Self, AllowListError> {
        let entry = entry.trim();
        if entry.contains('/') {
            return CidrBlock::from_str(entry).map(Self::Cidr);
        }
        let unbracketed = entry.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = IpAddr::from_str(unbracketed) {
            return Ok(Self::Address(canonical(ip)));
        }
        let host = normalize_host_label(entry);
        let valid = !host.is_empty()
            && host.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '.' | '_'));
        if !valid {
            return Err(AllowListError::InvalidHost(entry.to_string()));
        }
        Ok(Self::Host(host))
    }

    /// Returns true when the rule permits the host/address pair.
    fn permits(&self, host: &str, ip: IpAddr) -> bool {
        match self {
            Self::Host(allowed) => allowed == host,
            Self::Address(allowed) => *allowed == canonical(ip),
            Self::Cidr(block) => block.contains(ip),
        }
    }
}

/// Operator-configured set of trusted internal destinations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    /// Parsed rules in configuration order.
    rules: Vec<AllowRule>,
}

impl AllowList {
    /// Parses a comma- or whitespace-separated allow-list string.
    ///
    /// # Errors
    ///
    /// Returns [`AllowListError`] for the first invalid entry.
    pub fn parse(value: &str) -> Result<Self, AllowListError> {
        Self::from_entries(value.split(|ch: char| ch == ',' || ch.is_whitespace()))
    }

    /// Builds an allow-list from individual entries; blank entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`AllowListError`] for the first invalid entry.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, AllowListError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            rules.push(AllowRule::parse(entry)?);
        }
        Ok(Self {
            rules,
        })
    }

    /// Returns the parsed rules.
    #[must_use]
    pub fn rules(&self) -> &[AllowRule] {
        &self.rules
    }

    /// Returns true when no rules are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns true when the URL host or resolved address is trusted.
    #[must_use]
    pub fn permits(&self, host: &str, ip: IpAddr) -> bool {
        let host = normalize_host_label(host);
        self.rules.iter().any(|rule| rule.permits(&host, ip))
    }
}

/// Normalizes a host label for comparisons.
fn normalize_host_label(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}
