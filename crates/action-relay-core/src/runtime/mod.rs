// crates/action-relay-core/src/runtime/mod.rs
// ============================================================================
// Module: Action Relay Runtime
// Description: In-process implementations of core interfaces.
// Purpose: Provide reference collaborators for embedding and tests.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! Runtime collaborators are simple in-memory implementations. Hosts with
//! durable storage supply their own [`crate::interfaces::PostStore`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::InMemoryPostStore;
