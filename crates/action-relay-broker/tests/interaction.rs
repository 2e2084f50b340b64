// crates/action-relay-broker/tests/interaction.rs
// ============================================================================
// Module: Interaction Service Tests
// Description: End-to-end post action, dialog, and trigger flows.
// Purpose: Validate envelopes, post updates, and plugin routing through the service.
// Dependencies: action-relay-broker, action-relay-core, axum, tokio
// ============================================================================

//! Interaction service flows over live loopback integrations and an
//! in-memory plugin bridge.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use action_relay_broker::TRIGGER_TOKEN_LENGTH;
use action_relay_core::ActionId;
use action_relay_core::ChannelId;
use action_relay_core::ChannelKind;
use action_relay_core::DialogSubmission;
use action_relay_core::DispatchError;
use action_relay_core::DispatchSettings;
use action_relay_core::IntegrationRequest;
use action_relay_core::PluginResponse;
use action_relay_core::PostId;
use action_relay_core::PostStore;
use action_relay_core::SessionCookies;
use action_relay_core::TeamId;
use action_relay_core::UserId;
use axum::Router;
use axum::body::Bytes;
use axum::routing::post;
use serde_json::Value;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::common::PLUGIN_ID;
use crate::common::RecordingBridge;
use crate::common::USER_ID;
use crate::common::action_post;
use crate::common::click;
use crate::common::loopback_settings;
use crate::common::service;
use crate::common::spawn_server;
use crate::common::store_with;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Router that records the last request body and replies with a fixed body.
fn capturing_router(reply: &'static str) -> (Router, Arc<Mutex<Option<Vec<u8>>>>) {
    let captured = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&captured);
    let app = Router::new().route(
        "/hook",
        post(move |body: Bytes| {
            let slot = Arc::clone(&slot);
            async move {
                *slot.lock().unwrap() = Some(body.to_vec());
                reply
            }
        }),
    );
    (app, captured)
}

fn captured_request(captured: &Mutex<Option<Vec<u8>>>) -> IntegrationRequest {
    let body = captured.lock().unwrap().clone().unwrap();
    serde_json::from_slice(&body).unwrap()
}

struct FixedCookies;

impl SessionCookies for FixedCookies {
    fn cookie_for(&self, user_id: &UserId) -> Option<String> {
        Some(format!("MMUSERID={user_id}"))
    }
}

fn dialog(url: &str) -> DialogSubmission {
    let mut submission = DialogSubmission {
        url: url.to_string(),
        user_id: UserId::new(USER_ID),
        channel_id: ChannelId::new("channel-1"),
        team_id: TeamId::new("team-1"),
        callback_id: "deploy".to_string(),
        state: "opaque".to_string(),
        ..DialogSubmission::default()
    };
    submission.submission.insert("name".to_string(), json!("prod"));
    submission
}

// ============================================================================
// SECTION: Post Actions
// ============================================================================

#[tokio::test]
async fn versioned_update_is_merged_into_stored_post() {
    let (app, captured) = capturing_router(
        r#"{"update":{"message":"approved","props":{"status":"done","override_username":"spoof"}},"ephemeral_text":"thanks"}"#,
    );
    let (base, shutdown) = spawn_server(app).await;
    let store = store_with(action_post("p1", &format!("{base}/hook"), json!({"ticket": 42})));
    let service =
        service(Arc::clone(&store), RecordingBridge::replying("{}"), loopback_settings());

    let outcome = service.do_post_action(click("p1"), &CancellationToken::new()).await.unwrap();
    assert_eq!(outcome.ephemeral_text, "thanks");
    assert_eq!(outcome.trigger_id.as_str().len(), TRIGGER_TOKEN_LENGTH);

    let stored = store.get_by_id(&PostId::new("p1")).await.unwrap().unwrap();
    assert_eq!(Some(&stored), outcome.updated_post.as_ref());
    assert_eq!(stored.message, "approved");
    assert_eq!(stored.props["status"], "done");
    assert_eq!(stored.props["override_username"], "deploy-bot");
    assert_eq!(stored.find_action(&ActionId::new("approve")).unwrap().name, "Approve");

    let request = captured_request(&captured);
    assert_eq!(request.post_id.as_str(), "p1");
    assert_eq!(request.user_id.as_str(), USER_ID);
    assert_eq!(request.team_id.as_str(), "team-1");
    assert_eq!(request.trigger_id, outcome.trigger_id);
    assert_eq!(request.context["ticket"], 42);
    let _ = shutdown.send(());
}

#[tokio::test]
async fn legacy_post_shape_is_applied() {
    let (app, _) = capturing_router(r#"{"post":{"message":"legacy","is_pinned":true}}"#);
    let (base, shutdown) = spawn_server(app).await;
    let store = store_with(action_post("p1", &format!("{base}/hook"), json!({})));
    let service =
        service(Arc::clone(&store), RecordingBridge::replying("{}"), loopback_settings());

    service.do_post_action(click("p1"), &CancellationToken::new()).await.unwrap();
    let stored = store.get_by_id(&PostId::new("p1")).await.unwrap().unwrap();
    assert_eq!(stored.message, "legacy");
    assert!(stored.is_pinned);
    assert_eq!(stored.props["override_username"], "deploy-bot");
    let _ = shutdown.send(());
}

#[tokio::test]
async fn empty_body_leaves_post_untouched() {
    let (app, _) = capturing_router("");
    let (base, shutdown) = spawn_server(app).await;
    let original = action_post("p1", &format!("{base}/hook"), json!({}));
    let store = store_with(original.clone());
    let service =
        service(Arc::clone(&store), RecordingBridge::replying("{}"), loopback_settings());

    let outcome = service.do_post_action(click("p1"), &CancellationToken::new()).await.unwrap();
    assert!(outcome.updated_post.is_none());
    assert!(outcome.ephemeral_text.is_empty());
    assert_eq!(store.get_by_id(&PostId::new("p1")).await.unwrap().unwrap(), original);
    let _ = shutdown.send(());
}

#[tokio::test]
async fn malformed_body_is_reported() {
    let (app, _) = capturing_router("not json");
    let (base, shutdown) = spawn_server(app).await;
    let store = store_with(action_post("p1", &format!("{base}/hook"), json!({})));
    let service = service(store, RecordingBridge::replying("{}"), loopback_settings());

    let err = service.do_post_action(click("p1"), &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, DispatchError::MalformedResponse(_)), "{err:?}");
    let _ = shutdown.send(());
}

#[tokio::test]
async fn direct_channel_omits_team_fields() {
    let (app, captured) = capturing_router("{}");
    let (base, shutdown) = spawn_server(app).await;
    let store = store_with(action_post("p1", &format!("{base}/hook"), json!({})));
    let service = service(store, RecordingBridge::replying("{}"), loopback_settings());
    let mut request = click("p1");
    request.channel.kind = ChannelKind::Direct;

    service.do_post_action(request, &CancellationToken::new()).await.unwrap();
    let sent = captured_request(&captured);
    assert!(sent.team_id.is_empty());
    assert!(sent.team_name.is_empty());
    let _ = shutdown.send(());
}

#[tokio::test]
async fn selected_option_travels_in_context() {
    let (app, captured) = capturing_router("{}");
    let (base, shutdown) = spawn_server(app).await;
    let mut post = action_post("p1", &format!("{base}/hook"), json!({}));
    post.props.insert(
        "attachments".to_string(),
        json!([{"actions": [{
            "id": "approve",
            "name": "Pick",
            "type": "select",
            "data_source": "users",
            "integration": {"url": format!("{base}/hook"), "context": {}},
        }]}]),
    );
    let service = service(store_with(post), RecordingBridge::replying("{}"), loopback_settings());
    let mut request = click("p1");
    request.selected_option = Some("user-9".to_string());

    service.do_post_action(request, &CancellationToken::new()).await.unwrap();
    let sent = captured_request(&captured);
    assert_eq!(sent.selected_option(), Some("user-9"));
    assert_eq!(sent.data_source, "users");
    let _ = shutdown.send(());
}

#[tokio::test]
async fn unknown_post_and_action_are_not_found() {
    let store = store_with(action_post("p1", "/plugins/myplugin/hook", json!({})));
    let service = service(store, RecordingBridge::replying("{}"), loopback_settings());
    let cancel = CancellationToken::new();

    let err = service.do_post_action(click("missing"), &cancel).await.unwrap_err();
    assert!(matches!(err, DispatchError::PostNotFound(_)), "{err:?}");
    assert_eq!(err.status_code(), 404);

    let mut request = click("p1");
    request.action_id = ActionId::new("nope");
    let err = service.do_post_action(request, &cancel).await.unwrap_err();
    assert!(matches!(err, DispatchError::ActionNotFound(_)), "{err:?}");
}

#[tokio::test]
async fn plugin_action_is_routed_through_bridge() {
    let bridge = RecordingBridge::new(|request| {
        let reply = if request.query_values("param") == ["1"] {
            r#"{"update":{"message":"from plugin"}}"#
        } else {
            "{}"
        };
        Ok(PluginResponse::ok(reply))
    });
    let store = store_with(action_post(
        "p1",
        "https://chat.example.com/plugins/myplugin/actions/approve?param=1",
        json!({}),
    ));
    let service = service(Arc::clone(&store), Arc::clone(&bridge), loopback_settings())
        .with_session_cookies(Arc::new(FixedCookies));

    let outcome = service.do_post_action(click("p1"), &CancellationToken::new()).await.unwrap();
    assert_eq!(outcome.updated_post.unwrap().message, "from plugin");

    let requests = bridge.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].plugin_id.as_str(), PLUGIN_ID);
    assert_eq!(requests[0].path, "/actions/approve");
    assert_eq!(requests[0].header("cookie"), Some("MMUSERID=user-1"));
    assert_eq!(requests[0].header("content-type"), Some("application/json"));
}

#[tokio::test]
async fn subpath_site_url_routes_to_plugin() {
    let bridge = RecordingBridge::replying("{}");
    let store = store_with(action_post(
        "p1",
        "https://chat.example.com/team-chat/plugins/myplugin/hook",
        json!({}),
    ));
    let mut settings = DispatchSettings::clone(&loopback_settings());
    settings.site_url = "https://chat.example.com/team-chat/".to_string();
    let service = service(store, Arc::clone(&bridge), Arc::new(settings));

    service.do_post_action(click("p1"), &CancellationToken::new()).await.unwrap();
    assert_eq!(bridge.requests()[0].path, "/hook");
}

#[tokio::test]
async fn unknown_plugin_is_not_found() {
    let store = store_with(action_post("p1", "/plugins/other/hook", json!({})));
    let service = service(store, RecordingBridge::replying("{}"), loopback_settings());

    let err = service.do_post_action(click("p1"), &CancellationToken::new()).await.unwrap_err();
    assert_eq!(err, DispatchError::PluginNotFound("other".to_string()));
}

// ============================================================================
// SECTION: Triggers
// ============================================================================

#[tokio::test]
async fn trigger_from_action_opens_dialog_once_for_same_user() {
    let store = store_with(action_post("p1", "/plugins/myplugin/hook", json!({})));
    let service = service(store, RecordingBridge::replying("{}"), loopback_settings());
    let outcome = service.do_post_action(click("p1"), &CancellationToken::new()).await.unwrap();
    assert_eq!(service.triggers().len(), 1);

    let binding = service.open_dialog_trigger(&outcome.trigger_id, &UserId::new(USER_ID)).unwrap();
    assert_eq!(binding.post_id, Some(PostId::new("p1")));
    assert_eq!(binding.action_id, Some(ActionId::new("approve")));
    assert!(service.triggers().is_empty());

    let err = service.open_dialog_trigger(&outcome.trigger_id, &UserId::new(USER_ID)).unwrap_err();
    assert!(matches!(err, DispatchError::Trigger(_)), "{err:?}");
    assert_eq!(err.status_code(), 403);
}

#[tokio::test]
async fn trigger_rejects_other_users() {
    let store = store_with(action_post("p1", "/plugins/myplugin/hook", json!({})));
    let service = service(store, RecordingBridge::replying("{}"), loopback_settings());
    let outcome = service.do_post_action(click("p1"), &CancellationToken::new()).await.unwrap();

    let err = service.open_dialog_trigger(&outcome.trigger_id, &UserId::new("mallory")).unwrap_err();
    assert!(matches!(err, DispatchError::Trigger(_)), "{err:?}");
}

// ============================================================================
// SECTION: Dialogs
// ============================================================================

#[tokio::test]
async fn empty_dialog_url_fails_before_any_io() {
    let bridge = RecordingBridge::replying("{}");
    let store = store_with(action_post("p1", "/plugins/myplugin/hook", json!({})));
    let service = service(store, Arc::clone(&bridge), loopback_settings());

    let err = service.submit_dialog(dialog(""), None, &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, DispatchError::InvalidUrl(_)), "{err:?}");
    assert!(bridge.requests().is_empty());
}

#[tokio::test]
async fn plugin_dialog_branches_on_query_and_clears_url() {
    let bridge = RecordingBridge::new(|request| {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body["url"], "");
        let reply = match request.query_values("param").first().copied() {
            Some("a") => r#"{"errors":{"name":"taken"}}"#,
            Some("b") => r#"{"error":"try later"}"#,
            _ => "",
        };
        Ok(PluginResponse::ok(reply))
    });
    let store = store_with(action_post("p1", "/plugins/myplugin/hook", json!({})));
    let service = service(store, Arc::clone(&bridge), loopback_settings());
    let cancel = CancellationToken::new();

    let first = service
        .submit_dialog(dialog("/plugins/myplugin/dialog?param=a"), None, &cancel)
        .await
        .unwrap();
    assert_eq!(first.errors, BTreeMap::from([("name".to_string(), "taken".to_string())]));
    assert!(first.error.is_empty());

    let second = service
        .submit_dialog(dialog("/plugins/myplugin/dialog?param=b"), None, &cancel)
        .await
        .unwrap();
    assert_eq!(second.error, "try later");
    assert!(second.errors.is_empty());

    let third = service.submit_dialog(dialog("/plugins/myplugin/dialog"), None, &cancel).await;
    assert_eq!(third.unwrap(), action_relay_core::DialogResponse::default());
    assert_eq!(bridge.requests().len(), 3);
}

#[tokio::test]
async fn network_dialog_returns_errors_unchanged() {
    let (app, captured) = capturing_router(r#"{"errors":{"name":"required","size":"too big"}}"#);
    let (base, shutdown) = spawn_server(app).await;
    let store = store_with(action_post("p1", "/plugins/myplugin/hook", json!({})));
    let service = service(store, RecordingBridge::replying("{}"), loopback_settings());

    let response = service
        .submit_dialog(dialog(&format!("{base}/hook")), None, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(response.errors.len(), 2);
    assert_eq!(response.errors["size"], "too big");

    let sent: Value = serde_json::from_slice(&captured.lock().unwrap().clone().unwrap()).unwrap();
    assert_eq!(sent["url"], "");
    assert_eq!(sent["callback_id"], "deploy");
    assert_eq!(sent["submission"]["name"], "prod");
    let _ = shutdown.send(());
}
