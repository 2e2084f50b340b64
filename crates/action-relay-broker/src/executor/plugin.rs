// crates/action-relay-broker/src/executor/plugin.rs
// ============================================================================
// Module: Plugin Executor
// Description: In-process execution for plugin-local action targets.
// Purpose: Route callbacks to plugin HTTP handlers without a network hop.
// Dependencies: action-relay-core, url
// ============================================================================

//! ## Overview
//! [`PluginExecutor`] turns a plugin route into a [`PluginRequest`] and hands
//! it to the host's [`PluginBridge`]. Query parameters embedded in the action
//! URL come first, followed by explicit caller values, so repeated keys
//! become multi-valued parameters.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use action_relay_core::DispatchError;
use action_relay_core::DispatchSettings;
use action_relay_core::PluginBridge;
use action_relay_core::PluginBridgeError;
use action_relay_core::PluginRequest;
use action_relay_core::ResolvedTarget;
use async_trait::async_trait;
use url::form_urlencoded;

use crate::executor::Executor;
use crate::executor::JSON_CONTENT_TYPE;
use crate::executor::OutboundCall;
use crate::executor::RawResponse;
use crate::executor::enforce_max_bytes;

// ============================================================================
// SECTION: Plugin Executor
// ============================================================================

/// Executor for plugin-local targets.
#[derive(Clone)]
pub struct PluginExecutor {
    /// Host bridge into plugin HTTP handlers.
    bridge: Arc<dyn PluginBridge>,
}

impl PluginExecutor {
    /// Creates a plugin executor over the given bridge.
    #[must_use]
    pub fn new(bridge: Arc<dyn PluginBridge>) -> Self {
        Self {
            bridge,
        }
    }
}

#[async_trait]
impl Executor for PluginExecutor {
    async fn execute(
        &self,
        target: &ResolvedTarget,
        call: &OutboundCall,
        settings: &DispatchSettings,
    ) -> Result<RawResponse, DispatchError> {
        let ResolvedTarget::PluginLocal(route) = target else {
            return Err(DispatchError::Internal(
                "plugin executor received a network target".to_string(),
            ));
        };
        let mut headers = vec![("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string())];
        if let Some(cookie) = &call.cookie {
            headers.push(("Cookie".to_string(), cookie.clone()));
        }
        let request = PluginRequest {
            method: "POST".to_string(),
            plugin_id: route.plugin_id().clone(),
            path: route.path().to_string(),
            query: merge_query(route.query(), &call.query),
            headers,
            body: call.body.clone(),
        };
        let response = self.bridge.dispatch(request).await.map_err(|err| match err {
            PluginBridgeError::NotFound(id) => DispatchError::PluginNotFound(id),
            PluginBridgeError::Failed(message) => DispatchError::ConnectionError(message),
        })?;
        enforce_max_bytes(response.body.len(), settings.max_response_bytes)?;
        Ok(RawResponse {
            status: response.status,
            body: response.body,
        })
    }
}

/// Merges embedded query parameters with explicit caller values.
///
/// Embedded values come first; keys present in both keep every value.
#[must_use]
pub fn merge_query(embedded: &str, explicit: &[(String, String)]) -> Vec<(String, String)> {
    form_urlencoded::parse(embedded.as_bytes())
        .into_owned()
        .chain(explicit.iter().cloned())
        .collect()
}
