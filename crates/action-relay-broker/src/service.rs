// crates/action-relay-broker/src/service.rs
// ============================================================================
// Module: Interaction Service
// Description: End-to-end post action and dialog submission flows.
// Purpose: Tie storage, triggers, dispatch, decoding, and post mutation together.
// Dependencies: action-relay-core, tokio-util, tracing
// ============================================================================

//! ## Overview
//! [`InteractionService::do_post_action`] looks up the clicked action, issues
//! a trigger token, sends the callback, and folds any returned update back
//! into the stored post. [`InteractionService::submit_dialog`] forwards a
//! dialog submission and returns the integration's verdict unchanged.
//! Invariants:
//! - Settings are snapshotted once per call; reloads never affect it.
//! - Dialog URLs are validated before any I/O and never sent on the wire.
//! - Updates are applied under the protected-field merge rules.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use action_relay_core::ActionId;
use action_relay_core::ActionInvocation;
use action_relay_core::ChannelRef;
use action_relay_core::DialogResponse;
use action_relay_core::DialogSubmission;
use action_relay_core::DispatchError;
use action_relay_core::IntegrationRequest;
use action_relay_core::NoSessionCookies;
use action_relay_core::Post;
use action_relay_core::PostId;
use action_relay_core::PostStore;
use action_relay_core::SessionCookies;
use action_relay_core::SettingsSource;
use action_relay_core::TeamRef;
use action_relay_core::TriggerToken;
use action_relay_core::UserId;
use action_relay_core::UserRef;
use action_relay_core::apply_post_update;
use action_relay_core::decode_dialog_response;
use action_relay_core::decode_integration_response;
use action_relay_core::encode_dialog_submission;
use action_relay_core::encode_integration_request;
use action_relay_core::resolve_action_url;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::dispatcher::ActionDispatcher;
use crate::executor::OutboundCall;
use crate::trigger::TriggerBinding;
use crate::trigger::TriggerCorrelator;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Post action request from the acting user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostActionRequest {
    /// Post carrying the action.
    pub post_id: PostId,
    /// Clicked action.
    pub action_id: ActionId,
    /// Acting user.
    pub user: UserRef,
    /// Channel containing the post.
    pub channel: ChannelRef,
    /// Team owning the channel, if any.
    pub team: Option<TeamRef>,
    /// Option chosen in a select menu.
    pub selected_option: Option<String>,
    /// Explicit `Cookie` header; falls back to the session cookie lookup.
    pub cookie: Option<String>,
}

/// Result of a post action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    /// Trigger token issued for this dispatch.
    pub trigger_id: TriggerToken,
    /// Text shown only to the acting user.
    pub ephemeral_text: String,
    /// Stored post after applying the integration's update, if any.
    pub updated_post: Option<Post>,
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Interactive action and dialog service.
#[derive(Clone)]
pub struct InteractionService {
    /// Post storage.
    posts: Arc<dyn PostStore>,
    /// Callback dispatcher.
    dispatcher: ActionDispatcher,
    /// Trigger token store.
    triggers: Arc<TriggerCorrelator>,
    /// Settings snapshot source.
    settings: Arc<dyn SettingsSource>,
    /// Session cookie lookup.
    cookies: Arc<dyn SessionCookies>,
}

impl InteractionService {
    /// Creates a service without session cookie forwarding.
    #[must_use]
    pub fn new(
        posts: Arc<dyn PostStore>,
        dispatcher: ActionDispatcher,
        triggers: Arc<TriggerCorrelator>,
        settings: Arc<dyn SettingsSource>,
    ) -> Self {
        Self {
            posts,
            dispatcher,
            triggers,
            settings,
            cookies: Arc::new(NoSessionCookies),
        }
    }

    /// Replaces the session cookie lookup.
    #[must_use]
    pub fn with_session_cookies(mut self, cookies: Arc<dyn SessionCookies>) -> Self {
        self.cookies = cookies;
        self
    }

    /// Returns the trigger store.
    #[must_use]
    pub fn triggers(&self) -> &TriggerCorrelator {
        &self.triggers
    }

    /// Executes the action a user clicked on a post.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::PostNotFound`] or
    /// [`DispatchError::ActionNotFound`] for unknown targets,
    /// [`DispatchError::InvalidUrl`] for actions without a usable URL, and any
    /// dispatch, decoding, or store failure.
    pub async fn do_post_action(
        &self,
        request: PostActionRequest,
        cancel: &CancellationToken,
    ) -> Result<ActionOutcome, DispatchError> {
        let settings = self.settings.snapshot();
        let post = self
            .posts
            .get_by_id(&request.post_id)
            .await?
            .ok_or_else(|| DispatchError::PostNotFound(request.post_id.to_string()))?;
        let action = post
            .find_action(&request.action_id)
            .ok_or_else(|| DispatchError::ActionNotFound(request.action_id.to_string()))?;
        let integration = action
            .integration
            .filter(|integration| !integration.url.trim().is_empty())
            .ok_or_else(|| DispatchError::InvalidUrl("action has no integration url".to_string()))?;

        let trigger_id = self
            .triggers
            .issue(TriggerBinding {
                user_id: request.user.id.clone(),
                post_id: Some(post.id.clone()),
                action_id: Some(action.id.clone()),
            })
            .map_err(|err| DispatchError::Trigger(err.to_string()))?;

        let cookie = self.cookie_for(request.cookie, &request.user.id);
        let envelope = IntegrationRequest::build(ActionInvocation {
            user: request.user,
            channel: request.channel,
            team: request.team,
            post_id: post.id.clone(),
            trigger_id: trigger_id.clone(),
            action_type: action.action_type,
            data_source: action.data_source,
            context: integration.context,
            selected_option: request.selected_option,
        });
        let call = OutboundCall::new(encode_integration_request(&envelope)?).with_cookie(cookie);
        let target = resolve_action_url(&integration.url, &settings.site_url)?;
        let raw = self.dispatcher.dispatch(&target, &call, &settings, cancel).await?;
        let response = decode_integration_response(&raw.body)?;

        let updated_post = match response.update {
            Some(update) if !update.is_empty() => {
                let merged = apply_post_update(&post, &update);
                debug!(post_id = %post.id, "applying integration post update");
                Some(self.posts.update(merged).await?)
            }
            _ => None,
        };
        Ok(ActionOutcome {
            trigger_id,
            ephemeral_text: response.ephemeral_text,
            updated_post,
        })
    }

    /// Forwards a dialog submission to its callback URL.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidUrl`] for an empty URL before any I/O,
    /// and any dispatch or decoding failure.
    pub async fn submit_dialog(
        &self,
        submission: DialogSubmission,
        cookie: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<DialogResponse, DispatchError> {
        if submission.url.trim().is_empty() {
            return Err(DispatchError::InvalidUrl("dialog url is empty".to_string()));
        }
        let settings = self.settings.snapshot();
        let target = resolve_action_url(&submission.url, &settings.site_url)?;
        let cookie = self.cookie_for(cookie, &submission.user_id);
        let call = OutboundCall::new(encode_dialog_submission(&submission)?).with_cookie(cookie);
        let raw = self.dispatcher.dispatch(&target, &call, &settings, cancel).await?;
        Ok(decode_dialog_response(&raw.body)?)
    }

    /// Validates a trigger token presented by a client opening a dialog.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Trigger`] when the token is unknown, expired,
    /// already used, or bound to a different user.
    pub fn open_dialog_trigger(
        &self,
        token: &TriggerToken,
        user_id: &UserId,
    ) -> Result<TriggerBinding, DispatchError> {
        self.triggers
            .validate_for(token, user_id)
            .map_err(|err| DispatchError::Trigger(err.to_string()))
    }

    /// Returns the explicit cookie or the session cookie for the user.
    fn cookie_for(&self, explicit: Option<String>, user_id: &UserId) -> Option<String> {
        explicit
            .filter(|cookie| !cookie.is_empty())
            .or_else(|| self.cookies.cookie_for(user_id))
    }
}
