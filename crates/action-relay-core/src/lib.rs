// crates/action-relay-core/src/lib.rs
// ============================================================================
// Module: Action Relay Core Library
// Description: Public API surface for the Action Relay core.
// Purpose: Expose interaction types, resolution, codec, and merge helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Action Relay core defines the data model and the pure, I/O-free logic of the
//! interactive action dispatcher: action URL resolution, allow-list and address
//! classification, the integration and dialog wire codecs, and the post
//! mutation rules applied to callback responses. Network execution lives in
//! `action-relay-broker`; configuration loading lives in `action-relay-config`.
//!
//! Security posture: action URLs, callback responses, and allow-list entries are
//! untrusted input; see `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::NoSessionCookies;
pub use interfaces::PluginBridge;
pub use interfaces::PluginBridgeError;
pub use interfaces::PluginRequest;
pub use interfaces::PluginResponse;
pub use interfaces::PostStore;
pub use interfaces::SessionCookies;
pub use interfaces::SettingsSource;
pub use interfaces::StoreError;
pub use runtime::InMemoryPostStore;
