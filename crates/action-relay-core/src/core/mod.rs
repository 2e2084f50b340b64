// crates/action-relay-core/src/core/mod.rs
// ============================================================================
// Module: Action Relay Core Types
// Description: Canonical interaction model and pure dispatch helpers.
// Purpose: Provide stable, serializable types shared by broker and config crates.
// Dependencies: serde, serde_json, thiserror, url
// ============================================================================

//! ## Overview
//! Core types describe posts and their interactive actions, the resolved
//! execution target of an action URL, the integration and dialog envelopes,
//! and the immutable settings snapshot consumed by a single dispatch.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod envelope;
pub mod error;
pub mod identifiers;
pub mod mutation;
pub mod network;
pub mod post;
pub mod settings;
pub mod target;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use envelope::ActionInvocation;
pub use envelope::CodecError;
pub use envelope::ContextMap;
pub use envelope::DialogResponse;
pub use envelope::DialogSubmission;
pub use envelope::IntegrationRequest;
pub use envelope::IntegrationResponse;
pub use envelope::PostUpdate;
pub use envelope::SELECTED_OPTION_KEY;
pub use envelope::decode_dialog_response;
pub use envelope::decode_integration_response;
pub use envelope::encode_dialog_submission;
pub use envelope::encode_integration_request;
pub use error::DispatchError;
pub use identifiers::ActionId;
pub use identifiers::ChannelId;
pub use identifiers::PluginId;
pub use identifiers::PostId;
pub use identifiers::TeamId;
pub use identifiers::TriggerToken;
pub use identifiers::UserId;
pub use mutation::apply_post_update;
pub use network::AllowList;
pub use network::AllowListError;
pub use network::AllowRule;
pub use network::CidrBlock;
pub use network::is_internal_address;
pub use post::ActionIntegration;
pub use post::ActionType;
pub use post::Attachment;
pub use post::ChannelKind;
pub use post::ChannelRef;
pub use post::PROP_ATTACHMENTS;
pub use post::PROP_FROM_WEBHOOK;
pub use post::PROP_OVERRIDE_ICON_URL;
pub use post::PROP_OVERRIDE_USERNAME;
pub use post::PROTECTED_PROPS;
pub use post::Post;
pub use post::PostAction;
pub use post::PropMap;
pub use post::TeamRef;
pub use post::UserRef;
pub use settings::DEFAULT_MAX_RESPONSE_BYTES;
pub use settings::DEFAULT_OUTGOING_TIMEOUT_SECS;
pub use settings::DispatchSettings;
pub use settings::effective_timeout;
pub use target::MAX_ACTION_URL_BYTES;
pub use target::NetworkTarget;
pub use target::PluginRoute;
pub use target::ResolveError;
pub use target::ResolvedTarget;
pub use target::resolve_action_url;
