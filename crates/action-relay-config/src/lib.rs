// crates/action-relay-config/src/lib.rs
// ============================================================================
// Module: Action Relay Config Library
// Description: Canonical config model, validation, and live reload.
// Purpose: Single source of truth for action-relay.toml semantics.
// Dependencies: action-relay-broker, action-relay-core, serde, toml
// ============================================================================

//! ## Overview
//! `action-relay-config` defines the configuration model for the action
//! relay. It provides strict, fail-closed validation and a reloadable
//! [`ConfigHandle`] that hands out immutable settings snapshots.
//!
//! Security posture: config inputs are untrusted; see
//! `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod handle;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use handle::ConfigHandle;
