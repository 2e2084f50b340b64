// crates/action-relay-broker/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared fixtures for broker integration tests.
// Purpose: Provide loopback servers, a fake plugin bridge, and post builders.
// Dependencies: action-relay-broker, action-relay-core, axum, tokio
// ============================================================================

//! ## Overview
//! Fixtures spin up loopback HTTP integrations with axum, record plugin
//! bridge traffic in memory, and build posts whose attachments carry
//! interactive actions.
//!
//! Security posture: loopback servers are internal addresses, so tests must
//! opt in through the allow-list exactly as an operator would.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::unwrap_in_result,
    reason = "Test fixtures favor direct unwraps for setup clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use action_relay_broker::ActionDispatcher;
use action_relay_broker::InteractionService;
use action_relay_broker::PostActionRequest;
use action_relay_broker::TriggerCorrelator;
use action_relay_core::ActionId;
use action_relay_core::AllowList;
use action_relay_core::ChannelId;
use action_relay_core::ChannelKind;
use action_relay_core::ChannelRef;
use action_relay_core::DispatchSettings;
use action_relay_core::InMemoryPostStore;
use action_relay_core::PluginBridge;
use action_relay_core::PluginBridgeError;
use action_relay_core::PluginRequest;
use action_relay_core::PluginResponse;
use action_relay_core::Post;
use action_relay_core::PostId;
use action_relay_core::TeamId;
use action_relay_core::TeamRef;
use action_relay_core::UserId;
use action_relay_core::UserRef;
use async_trait::async_trait;
use axum::Router;
use serde_json::Value;
use serde_json::json;
use tokio::sync::oneshot;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Site URL used by fixtures.
pub const SITE_URL: &str = "https://chat.example.com";

/// Plugin identifier the fake bridge serves.
pub const PLUGIN_ID: &str = "myplugin";

/// Action identifier used by fixture posts.
pub const ACTION_ID: &str = "approve";

/// Acting user identifier.
pub const USER_ID: &str = "user-1";

// ============================================================================
// SECTION: Loopback Servers
// ============================================================================

/// Serves the router on an ephemeral loopback port.
///
/// Returns the base URL and a sender that shuts the server down.
pub async fn spawn_server(app: Router) -> (String, oneshot::Sender<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });
    (format!("http://{addr}"), shutdown_tx)
}

// ============================================================================
// SECTION: Plugin Bridge
// ============================================================================

/// Plugin handler signature used by the fake bridge.
pub type PluginHandler =
    Arc<dyn Fn(&PluginRequest) -> Result<PluginResponse, PluginBridgeError> + Send + Sync>;

/// Plugin bridge that records every request and serves one plugin.
pub struct RecordingBridge {
    /// Requests in arrival order.
    requests: Mutex<Vec<PluginRequest>>,
    /// Handler for [`PLUGIN_ID`].
    handler: PluginHandler,
}

impl RecordingBridge {
    /// Creates a bridge that answers with the handler.
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&PluginRequest) -> Result<PluginResponse, PluginBridgeError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            handler: Arc::new(handler),
        })
    }

    /// Creates a bridge that answers every request with the same body.
    pub fn replying(body: &'static str) -> Arc<Self> {
        Self::new(move |_| Ok(PluginResponse::ok(body)))
    }

    /// Returns a copy of the recorded requests.
    pub fn requests(&self) -> Vec<PluginRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PluginBridge for RecordingBridge {
    async fn dispatch(&self, request: PluginRequest) -> Result<PluginResponse, PluginBridgeError> {
        self.requests.lock().unwrap().push(request.clone());
        if request.plugin_id.as_str() != PLUGIN_ID {
            return Err(PluginBridgeError::NotFound(request.plugin_id.to_string()));
        }
        (self.handler)(&request)
    }
}

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Builds settings with the fixture site URL and the given allow-list.
pub fn settings(allow_list: &str) -> Arc<DispatchSettings> {
    let mut settings = DispatchSettings::with_site_url(SITE_URL);
    settings.allow_list = AllowList::parse(allow_list).unwrap();
    Arc::new(settings)
}

/// Builds settings that permit loopback integrations.
pub fn loopback_settings() -> Arc<DispatchSettings> {
    settings("127.0.0.1")
}

/// Builds loopback settings with a custom timeout.
pub fn loopback_settings_with_timeout(timeout: Duration) -> Arc<DispatchSettings> {
    let mut settings = DispatchSettings::clone(&loopback_settings());
    settings.timeout = timeout;
    Arc::new(settings)
}

// ============================================================================
// SECTION: Posts
// ============================================================================

/// Builds a post with one button action bound to the URL.
pub fn action_post(post_id: &str, url: &str, context: Value) -> Post {
    let mut post = Post::new(PostId::new(post_id), ChannelId::new("channel-1"), UserId::new("bot"));
    post.message = "please approve".to_string();
    post.props.insert(
        "attachments".to_string(),
        json!([{
            "text": "deploy request",
            "actions": [{
                "id": ACTION_ID,
                "name": "Approve",
                "type": "button",
                "integration": {"url": url, "context": context},
            }],
        }]),
    );
    post.props.insert("override_username".to_string(), json!("deploy-bot"));
    post
}

/// Stores a fixture post and returns the store.
pub fn store_with(post: Post) -> Arc<InMemoryPostStore> {
    let store = Arc::new(InMemoryPostStore::new());
    store.insert(post).unwrap();
    store
}

/// Builds a service over the store, bridge, and settings.
pub fn service(
    store: Arc<InMemoryPostStore>,
    bridge: Arc<RecordingBridge>,
    settings: Arc<DispatchSettings>,
) -> InteractionService {
    InteractionService::new(
        store,
        ActionDispatcher::new(bridge),
        Arc::new(TriggerCorrelator::default()),
        Arc::new(settings),
    )
}

/// Builds a click on the fixture action in a team channel.
pub fn click(post_id: &str) -> PostActionRequest {
    PostActionRequest {
        post_id: PostId::new(post_id),
        action_id: ActionId::new(ACTION_ID),
        user: UserRef {
            id: UserId::new(USER_ID),
            name: "alice".to_string(),
        },
        channel: ChannelRef {
            id: ChannelId::new("channel-1"),
            name: "town-square".to_string(),
            kind: ChannelKind::Open,
        },
        team: Some(TeamRef {
            id: TeamId::new("team-1"),
            name: "engineering".to_string(),
        }),
        selected_option: None,
        cookie: None,
    }
}
