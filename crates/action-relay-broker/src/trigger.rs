// crates/action-relay-broker/src/trigger.rs
// ============================================================================
// Module: Trigger Correlator
// Description: Issues and validates short-lived, single-use trigger tokens.
// Purpose: Correlate an action dispatch with a later client dialog open.
// Dependencies: action-relay-core, dashmap, rand, thiserror
// ============================================================================

//! ## Overview
//! A trigger token is 16 bytes from the OS random source encoded as 26
//! lowercase base32 characters. Each issued token is bound to the acting
//! user and the originating post and action, lives for a fixed TTL, and is
//! consumed by its first validation.
//! Invariants:
//! - Tokens are never reused; validation removes them.
//! - The store never exceeds its configured capacity; slots are reserved
//!   atomically before a token is inserted.
//! - Expiry is measured from the issue instant, so any TTL is accepted.
//! - Expired entries are swept on issue and by [`TriggerCorrelator::reap_expired`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use action_relay_core::ActionId;
use action_relay_core::PostId;
use action_relay_core::TriggerToken;
use action_relay_core::UserId;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Length of an issued trigger token.
pub const TRIGGER_TOKEN_LENGTH: usize = 26;

/// Default token lifetime.
pub const DEFAULT_TRIGGER_TTL: Duration = Duration::from_secs(3);

/// Default maximum number of outstanding tokens.
pub const DEFAULT_TRIGGER_MAX_ENTRIES: usize = 65_536;

/// Number of issues between opportunistic sweeps.
const SWEEP_INTERVAL: u64 = 256;

/// Token alphabet (32 lowercase symbols).
const TOKEN_ALPHABET: &[u8; 32] = b"ybndrfg8ejkmcpqxot1uwisza345h769";

/// Random bytes per token.
const TOKEN_ENTROPY_BYTES: usize = 16;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Context a trigger token is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerBinding {
    /// Acting user.
    pub user_id: UserId,
    /// Originating post, if any.
    pub post_id: Option<PostId>,
    /// Originating action, if any.
    pub action_id: Option<ActionId>,
}

/// Trigger store settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerSettings {
    /// Token lifetime.
    pub ttl: Duration,
    /// Maximum number of outstanding tokens.
    pub max_entries: usize,
}

impl Default for TriggerSettings {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TRIGGER_TTL,
            max_entries: DEFAULT_TRIGGER_MAX_ENTRIES,
        }
    }
}

/// Trigger validation failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriggerError {
    /// Token was never issued or was already consumed.
    #[error("unknown trigger token")]
    Unknown,
    /// Token outlived its TTL.
    #[error("trigger token expired")]
    Expired,
    /// Token is bound to a different user.
    #[error("trigger token bound to a different user")]
    UserMismatch,
    /// Store is at capacity with live tokens.
    #[error("trigger store is full")]
    StoreFull,
}

/// Stored token entry.
#[derive(Debug, Clone)]
struct TriggerEntry {
    /// Bound context.
    binding: TriggerBinding,
    /// Issue instant.
    issued_at: Instant,
}

// ============================================================================
// SECTION: Correlator
// ============================================================================

/// Concurrent trigger token store.
#[derive(Debug)]
pub struct TriggerCorrelator {
    /// Outstanding tokens.
    entries: DashMap<TriggerToken, TriggerEntry>,
    /// Store settings.
    settings: TriggerSettings,
    /// Issue counter driving opportunistic sweeps.
    issued: AtomicU64,
    /// Reserved slots; always at least the number of stored entries.
    reserved: AtomicUsize,
}

impl Default for TriggerCorrelator {
    fn default() -> Self {
        Self::new(TriggerSettings::default())
    }
}

impl TriggerCorrelator {
    /// Creates a correlator with the given settings.
    #[must_use]
    pub fn new(settings: TriggerSettings) -> Self {
        Self {
            entries: DashMap::new(),
            settings,
            issued: AtomicU64::new(0),
            reserved: AtomicUsize::new(0),
        }
    }

    /// Returns the store settings.
    #[must_use]
    pub const fn settings(&self) -> TriggerSettings {
        self.settings
    }

    /// Returns the number of outstanding tokens, including expired ones not
    /// yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no tokens are outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Issues a new token bound to the given context.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::StoreFull`] when the store is at capacity
    /// after sweeping expired tokens.
    pub fn issue(&self, binding: TriggerBinding) -> Result<TriggerToken, TriggerError> {
        let count = self.issued.fetch_add(1, Ordering::Relaxed);
        if count % SWEEP_INTERVAL == 0 {
            self.reap_expired();
        }
        if !self.try_reserve() {
            self.reap_expired();
            if !self.try_reserve() {
                return Err(TriggerError::StoreFull);
            }
        }
        let entry = TriggerEntry {
            binding,
            issued_at: Instant::now(),
        };
        loop {
            let token = generate_token();
            if let Entry::Vacant(slot) = self.entries.entry(token.clone()) {
                slot.insert(entry);
                return Ok(token);
            }
        }
    }

    /// Consumes a token and returns its binding.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::Unknown`] or [`TriggerError::Expired`].
    pub fn validate(&self, token: &TriggerToken) -> Result<TriggerBinding, TriggerError> {
        let (_, entry) = self.entries.remove(token).ok_or(TriggerError::Unknown)?;
        self.reserved.fetch_sub(1, Ordering::AcqRel);
        if entry.issued_at.elapsed() >= self.settings.ttl {
            return Err(TriggerError::Expired);
        }
        Ok(entry.binding)
    }

    /// Consumes a token and checks that it is bound to the given user.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::UserMismatch`] when the token belongs to a
    /// different user, plus every [`TriggerCorrelator::validate`] error.
    pub fn validate_for(
        &self,
        token: &TriggerToken,
        user_id: &UserId,
    ) -> Result<TriggerBinding, TriggerError> {
        let binding = self.validate(token)?;
        if &binding.user_id != user_id {
            return Err(TriggerError::UserMismatch);
        }
        Ok(binding)
    }

    /// Removes expired tokens and returns how many were removed.
    pub fn reap_expired(&self) -> usize {
        let ttl = self.settings.ttl;
        let mut removed = 0usize;
        self.entries.retain(|_, entry| {
            let live = entry.issued_at.elapsed() < ttl;
            if !live {
                removed += 1;
            }
            live
        });
        if removed > 0 {
            self.reserved.fetch_sub(removed, Ordering::AcqRel);
        }
        removed
    }

    /// Claims one slot if the store is below capacity.
    fn try_reserve(&self) -> bool {
        let max_entries = self.settings.max_entries;
        self.reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |reserved| {
                (reserved < max_entries).then_some(reserved + 1)
            })
            .is_ok()
    }
}

// ============================================================================
// SECTION: Token Generation
// ============================================================================

/// Generates a fresh random token.
fn generate_token() -> TriggerToken {
    let mut bytes = [0u8; TOKEN_ENTROPY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    TriggerToken::new(encode_token(&bytes))
}

/// Encodes bytes as unpadded base32 over [`TOKEN_ALPHABET`].
fn encode_token(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(TRIGGER_TOKEN_LENGTH);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    for byte in bytes {
        buffer = (buffer << 8) | u32::from(*byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            encoded.push(symbol(buffer >> bits));
        }
        buffer &= (1 << bits) - 1;
    }
    if bits > 0 {
        encoded.push(symbol(buffer << (5 - bits)));
    }
    encoded
}

/// Returns the alphabet symbol for the low five bits of `value`.
fn symbol(value: u32) -> char {
    let index = usize::try_from(value & 0x1f).unwrap_or_default();
    char::from(TOKEN_ALPHABET[index])
}
