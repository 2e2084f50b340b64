// crates/action-relay-core/src/core/envelope.rs
// ============================================================================
// Module: Action Relay Wire Envelopes
// Description: Integration request/response and dialog submission envelopes.
// Purpose: Speak the action-callback and dialog protocols with stable field names.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Two small JSON protocols travel between the relay and integration
//! endpoints:
//! - Action callbacks: [`IntegrationRequest`] out, [`IntegrationResponse`]
//!   back. Responses arrive either in the versioned `update` shape or the
//!   legacy `post` shape and normalize to a single [`PostUpdate`].
//! - Dialog submissions: [`DialogSubmission`] out (with its URL cleared),
//!   [`DialogResponse`] back.
//!
//! Invariants:
//! - `context` and `submission` values round-trip with their JSON types.
//! - An empty (or whitespace-only) response body decodes to an empty response.
//! - A non-empty body that is not valid JSON fails closed with
//!   [`CodecError::Malformed`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::ChannelId;
use crate::core::identifiers::PostId;
use crate::core::identifiers::TeamId;
use crate::core::identifiers::TriggerToken;
use crate::core::identifiers::UserId;
use crate::core::post::ActionType;
use crate::core::post::ChannelRef;
use crate::core::post::PropMap;
use crate::core::post::TeamRef;
use crate::core::post::UserRef;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Context key carrying the option chosen in a select menu.
pub const SELECTED_OPTION_KEY: &str = "selected_option";

/// Opaque author-supplied context mapping (ordered, JSON-typed values).
pub type ContextMap = BTreeMap<String, Value>;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Wire codec failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Outbound envelope could not be serialized.
    #[error("envelope encoding failed: {0}")]
    Encode(String),
    /// Inbound body was not a valid envelope.
    #[error("malformed response body: {0}")]
    Malformed(String),
}

// ============================================================================
// SECTION: Action Callback Request
// ============================================================================

/// Inputs for building an action callback request.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionInvocation {
    /// Acting user.
    pub user: UserRef,
    /// Channel containing the post.
    pub channel: ChannelRef,
    /// Team owning the channel, if any.
    pub team: Option<TeamRef>,
    /// Post the action is attached to.
    pub post_id: PostId,
    /// Trigger token issued for this dispatch.
    pub trigger_id: TriggerToken,
    /// Kind of the action being invoked.
    pub action_type: ActionType,
    /// Select menu data source declared on the action.
    pub data_source: String,
    /// Author-supplied context from the action definition.
    pub context: ContextMap,
    /// Option chosen in a select menu.
    pub selected_option: Option<String>,
}

/// Action callback request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationRequest {
    /// Acting user identifier.
    pub user_id: UserId,
    /// Acting username.
    #[serde(default)]
    pub user_name: String,
    /// Channel identifier.
    pub channel_id: ChannelId,
    /// Channel name.
    #[serde(default)]
    pub channel_name: String,
    /// Team identifier; empty for direct and group channels.
    pub team_id: TeamId,
    /// Team name; empty for direct and group channels.
    #[serde(default)]
    pub team_name: String,
    /// Post identifier.
    pub post_id: PostId,
    /// Trigger token for a follow-up dialog open.
    pub trigger_id: TriggerToken,
    /// Action kind.
    #[serde(rename = "type", default)]
    pub action_type: ActionType,
    /// Select menu data source; set only when an option was chosen.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data_source: String,
    /// Context passed through from the action definition.
    #[serde(default)]
    pub context: ContextMap,
}

impl IntegrationRequest {
    /// Builds the request envelope for an action invocation.
    ///
    /// Team fields are populated only for team channels. The data source and
    /// selected option are populated only for select actions with a choice.
    #[must_use]
    pub fn build(invocation: ActionInvocation) -> Self {
        let ActionInvocation {
            user,
            channel,
            team,
            post_id,
            trigger_id,
            action_type,
            data_source,
            mut context,
            selected_option,
        } = invocation;

        let (team_id, team_name) = match team {
            Some(team) if channel.kind.has_team() => (team.id, team.name),
            _ => (TeamId::new(""), String::new()),
        };

        let selected = selected_option.filter(|option| !option.is_empty());
        let data_source = match (action_type, selected) {
            (ActionType::Select, Some(option)) => {
                context.insert(SELECTED_OPTION_KEY.to_string(), Value::String(option));
                data_source
            }
            _ => String::new(),
        };

        Self {
            user_id: user.id,
            user_name: user.name,
            channel_id: channel.id,
            channel_name: channel.name,
            team_id,
            team_name,
            post_id,
            trigger_id,
            action_type,
            data_source,
            context,
        }
    }

    /// Returns the selected option carried in the context, if any.
    #[must_use]
    pub fn selected_option(&self) -> Option<&str> {
        self.context.get(SELECTED_OPTION_KEY).and_then(Value::as_str)
    }
}

/// Serializes an action callback request.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] when serialization fails.
pub fn encode_integration_request(request: &IntegrationRequest) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(request).map_err(|err| CodecError::Encode(err.to_string()))
}

// ============================================================================
// SECTION: Action Callback Response
// ============================================================================

/// Partial post update returned by an integration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostUpdate {
    /// Replacement message text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Replacement reaction flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_reactions: Option<bool>,
    /// Replacement pin flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
    /// Replacement property mapping, merged under protection rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<PropMap>,
}

impl PostUpdate {
    /// Returns true when the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.message.is_none()
            && self.has_reactions.is_none()
            && self.is_pinned.is_none()
            && self.props.is_none()
    }
}

/// Normalized action callback response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "IntegrationResponseWire")]
pub struct IntegrationResponse {
    /// Post update to apply, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<PostUpdate>,
    /// Text shown only to the acting user.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ephemeral_text: String,
}

/// Accepted inbound response shapes.
#[derive(Deserialize)]
struct IntegrationResponseWire {
    /// Versioned update shape.
    #[serde(default)]
    update: Option<PostUpdate>,
    /// Legacy partial-post shape.
    #[serde(default)]
    post: Option<PostUpdate>,
    /// Ephemeral text.
    #[serde(default)]
    ephemeral_text: Option<String>,
}

impl From<IntegrationResponseWire> for IntegrationResponse {
    fn from(wire: IntegrationResponseWire) -> Self {
        Self {
            update: wire.update.or(wire.post),
            ephemeral_text: wire.ephemeral_text.unwrap_or_default(),
        }
    }
}

/// Decodes an action callback response body.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] when a non-empty body is not a valid
/// response envelope.
pub fn decode_integration_response(body: &[u8]) -> Result<IntegrationResponse, CodecError> {
    if is_blank(body) {
        return Ok(IntegrationResponse::default());
    }
    serde_json::from_slice(body).map_err(|err| CodecError::Malformed(err.to_string()))
}

// ============================================================================
// SECTION: Dialog Protocol
// ============================================================================

/// Interactive dialog submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogSubmission {
    /// Destination URL; cleared before transmission.
    #[serde(default)]
    pub url: String,
    /// Submitting user identifier.
    pub user_id: UserId,
    /// Channel the dialog was opened in.
    pub channel_id: ChannelId,
    /// Team the dialog was opened in.
    pub team_id: TeamId,
    /// Author-supplied callback identifier.
    #[serde(default)]
    pub callback_id: String,
    /// Author-supplied opaque state.
    #[serde(default)]
    pub state: String,
    /// Submitted field values.
    #[serde(default)]
    pub submission: ContextMap,
    /// Whether the user cancelled the dialog.
    #[serde(default, skip_serializing_if = "is_false")]
    pub cancelled: bool,
}

/// Outbound dialog submission view with the URL cleared.
#[derive(Serialize)]
struct OutboundDialogSubmission<'a> {
    /// Always empty on the wire.
    url: &'static str,
    /// Submitting user identifier.
    user_id: &'a UserId,
    /// Channel identifier.
    channel_id: &'a ChannelId,
    /// Team identifier.
    team_id: &'a TeamId,
    /// Callback identifier.
    callback_id: &'a str,
    /// Opaque state.
    state: &'a str,
    /// Submitted values.
    submission: &'a ContextMap,
    /// Cancel flag.
    #[serde(skip_serializing_if = "is_false")]
    cancelled: bool,
}

/// Dialog callback response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogResponse {
    /// General error message.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    /// Per-field error messages.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
}

/// Serializes a dialog submission with its URL cleared.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] when serialization fails.
pub fn encode_dialog_submission(submission: &DialogSubmission) -> Result<Vec<u8>, CodecError> {
    let outbound = OutboundDialogSubmission {
        url: "",
        user_id: &submission.user_id,
        channel_id: &submission.channel_id,
        team_id: &submission.team_id,
        callback_id: &submission.callback_id,
        state: &submission.state,
        submission: &submission.submission,
        cancelled: submission.cancelled,
    };
    serde_json::to_vec(&outbound).map_err(|err| CodecError::Encode(err.to_string()))
}

/// Decodes a dialog callback response body.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] when a non-empty body is not a valid
/// dialog response.
pub fn decode_dialog_response(body: &[u8]) -> Result<DialogResponse, CodecError> {
    if is_blank(body) {
        return Ok(DialogResponse::default());
    }
    serde_json::from_slice(body).map_err(|err| CodecError::Malformed(err.to_string()))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when a body holds only ASCII whitespace.
fn is_blank(body: &[u8]) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}

/// Serde predicate skipping false flags.
#[allow(clippy::trivially_copy_pass_by_ref, reason = "Serde skip predicates take references.")]
const fn is_false(value: &bool) -> bool {
    !*value
}
