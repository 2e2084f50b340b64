// crates/action-relay-core/src/core/identifiers.rs
// ============================================================================
// Module: Action Relay Identifiers
// Description: Opaque identifiers for posts, actions, plugins, and triggers.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque UTF-8 strings issued by the host system. They
//! serialize transparently as JSON strings so the wire envelopes keep their
//! historical field shapes. No normalization or validation is applied here;
//! callers validate identifiers at their own trust boundaries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Declares an opaque string identifier newtype.
macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true when the identifier is empty.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_identifier! {
    /// User identifier of the acting user.
    UserId
}

string_identifier! {
    /// Channel identifier.
    ChannelId
}

string_identifier! {
    /// Team identifier. Direct and group channels have no team.
    TeamId
}

string_identifier! {
    /// Post (message) identifier.
    PostId
}

string_identifier! {
    /// Identifier of an interactive action attached to a post.
    ActionId
}

string_identifier! {
    /// Identifier of an in-process plugin.
    PluginId
}

string_identifier! {
    /// Opaque trigger token correlating a dispatch with a later dialog open.
    ///
    /// # Invariants
    /// - Issued tokens are 26 characters long and single use.
    TriggerToken
}
