// crates/action-relay-core/src/core/post.rs
// ============================================================================
// Module: Action Relay Post Model
// Description: Posts, message attachments, and interactive action definitions.
// Purpose: Locate the action a user clicked and describe the acting context.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Post`] carries a free-form property mapping. The `attachments` property
//! holds message attachments whose `actions` define buttons and select menus,
//! each bound to an integration URL and an opaque context mapping.
//! Invariants:
//! - Attachment decoding never mutates the stored property mapping.
//! - Props named in [`PROTECTED_PROPS`] are owned by the host system.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::envelope::ContextMap;
use crate::core::identifiers::ActionId;
use crate::core::identifiers::ChannelId;
use crate::core::identifiers::PostId;
use crate::core::identifiers::TeamId;
use crate::core::identifiers::UserId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Property key holding the message attachment list.
pub const PROP_ATTACHMENTS: &str = "attachments";
/// Property key marking posts created by incoming webhooks.
pub const PROP_FROM_WEBHOOK: &str = "from_webhook";
/// Property key overriding the displayed author name.
pub const PROP_OVERRIDE_USERNAME: &str = "override_username";
/// Property key overriding the displayed author icon.
pub const PROP_OVERRIDE_ICON_URL: &str = "override_icon_url";
/// Property keys that integration updates can never change.
pub const PROTECTED_PROPS: [&str; 3] =
    [PROP_FROM_WEBHOOK, PROP_OVERRIDE_USERNAME, PROP_OVERRIDE_ICON_URL];

/// Post property mapping.
pub type PropMap = BTreeMap<String, Value>;

// ============================================================================
// SECTION: Post
// ============================================================================

/// Stored message with its property mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Post identifier.
    pub id: PostId,
    /// Channel the post belongs to.
    pub channel_id: ChannelId,
    /// Author of the post.
    pub user_id: UserId,
    /// Message text.
    #[serde(default)]
    pub message: String,
    /// Whether the post has reactions.
    #[serde(default)]
    pub has_reactions: bool,
    /// Whether the post is pinned.
    #[serde(default)]
    pub is_pinned: bool,
    /// Property mapping (attachments, overrides, integration data).
    #[serde(default)]
    pub props: PropMap,
}

impl Post {
    /// Creates an empty post in the given channel.
    #[must_use]
    pub fn new(id: PostId, channel_id: ChannelId, user_id: UserId) -> Self {
        Self {
            id,
            channel_id,
            user_id,
            message: String::new(),
            has_reactions: false,
            is_pinned: false,
            props: PropMap::new(),
        }
    }

    /// Decodes the message attachments stored in the post props.
    ///
    /// Returns an empty list when the property is absent or malformed.
    #[must_use]
    pub fn attachments(&self) -> Vec<Attachment> {
        self.props
            .get(PROP_ATTACHMENTS)
            .and_then(|value| serde_json::from_value::<Vec<Attachment>>(value.clone()).ok())
            .unwrap_or_default()
    }

    /// Finds an interactive action by identifier across all attachments.
    #[must_use]
    pub fn find_action(&self, action_id: &ActionId) -> Option<PostAction> {
        if action_id.is_empty() {
            return None;
        }
        self.attachments()
            .into_iter()
            .flat_map(|attachment| attachment.actions)
            .find(|action| &action.id == action_id)
    }
}

/// Message attachment carrying interactive actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Attachment body text.
    #[serde(default)]
    pub text: String,
    /// Interactive actions rendered with the attachment.
    #[serde(default)]
    pub actions: Vec<PostAction>,
}

/// Interactive action kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Push button.
    #[default]
    Button,
    /// Select menu.
    Select,
}

impl ActionType {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Select => "select",
        }
    }
}

/// Interactive action attached to a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostAction {
    /// Action identifier assigned by the host system.
    #[serde(default)]
    pub id: ActionId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Action kind.
    #[serde(rename = "type", default)]
    pub action_type: ActionType,
    /// Data source for select menus (`users`, `channels`, or custom).
    #[serde(default)]
    pub data_source: String,
    /// Callback binding; actions without one cannot be dispatched.
    #[serde(default)]
    pub integration: Option<ActionIntegration>,
}

/// Callback binding for an interactive action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionIntegration {
    /// Raw, untrusted action URL.
    #[serde(default)]
    pub url: String,
    /// Author-supplied context passed through verbatim.
    #[serde(default)]
    pub context: ContextMap,
}

// ============================================================================
// SECTION: Acting Context
// ============================================================================

/// Acting user reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    /// User identifier.
    pub id: UserId,
    /// Username.
    pub name: String,
}

/// Channel kind, used to decide whether team fields are populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Public team channel.
    Open,
    /// Private team channel.
    Private,
    /// One-to-one direct message channel.
    Direct,
    /// Group message channel.
    Group,
}

impl ChannelKind {
    /// Returns true when the channel belongs to a team.
    #[must_use]
    pub const fn has_team(self) -> bool {
        matches!(self, Self::Open | Self::Private)
    }
}

/// Channel reference for the post being acted on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    /// Channel identifier.
    pub id: ChannelId,
    /// Channel name.
    pub name: String,
    /// Channel kind.
    pub kind: ChannelKind,
}

/// Team reference for team channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRef {
    /// Team identifier.
    pub id: TeamId,
    /// Team name.
    pub name: String,
}
