// crates/action-relay-broker/src/executor/http.rs
// ============================================================================
// Module: HTTP Executor
// Description: Guarded HTTP POST execution for network action targets.
// Purpose: Deliver callback envelopes to external integrations.
// Dependencies: action-relay-core, reqwest, url
// ============================================================================

//! ## Overview
//! [`HttpExecutor`] validates the destination scheme, runs the
//! [`NetworkGuard`], and POSTs the envelope with a client pinned to the
//! approved addresses.
//! Invariants:
//! - Scheme and policy failures are reported before any socket is opened.
//! - Redirects are never followed; a 3xx status is returned as-is.
//! - Proxies from the environment are ignored so pinning cannot be bypassed.
//! - Response bodies are read incrementally and capped at the configured size.

// ============================================================================
// SECTION: Imports
// ============================================================================

use action_relay_core::DispatchError;
use action_relay_core::DispatchSettings;
use action_relay_core::ResolvedTarget;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::COOKIE;
use reqwest::redirect::Policy;
use url::Url;

use crate::executor::Executor;
use crate::executor::JSON_CONTENT_TYPE;
use crate::executor::OutboundCall;
use crate::executor::RawResponse;
use crate::executor::enforce_max_bytes;
use crate::guard::NetworkGuard;
use crate::guard::PinnedDestination;

// ============================================================================
// SECTION: HTTP Executor
// ============================================================================

/// Executor for network targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpExecutor;

impl HttpExecutor {
    /// Creates an HTTP executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn execute(
        &self,
        target: &ResolvedTarget,
        call: &OutboundCall,
        settings: &DispatchSettings,
    ) -> Result<RawResponse, DispatchError> {
        let ResolvedTarget::Network(target) = target else {
            return Err(DispatchError::Internal(
                "http executor received a plugin target".to_string(),
            ));
        };
        let url = parse_destination(target.as_str())?;
        let pinned = NetworkGuard::check(&url, &settings.allow_list).await?;
        let client = pinned_client(&pinned)?;

        let mut request = client
            .post(url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(call.body.clone());
        if let Some(cookie) = &call.cookie {
            request = request.header(COOKIE, cookie.as_str());
        }
        let mut response = request.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();

        let max_bytes = settings.max_response_bytes;
        if let Some(length) = response.content_length() {
            enforce_max_bytes(usize::try_from(length).unwrap_or(usize::MAX), max_bytes)?;
        }
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(transport_error)? {
            enforce_max_bytes(body.len().saturating_add(chunk.len()), max_bytes)?;
            body.extend_from_slice(&chunk);
        }
        Ok(RawResponse {
            status,
            body,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a destination URL and validates its scheme.
pub(crate) fn parse_destination(raw: &str) -> Result<Url, DispatchError> {
    let scheme = raw.split_once(':').map(|(scheme, _)| scheme).unwrap_or_default();
    if !is_scheme_token(scheme) {
        return Err(DispatchError::MissingScheme(raw.to_string()));
    }
    let url = Url::parse(raw).map_err(|err| DispatchError::InvalidUrl(err.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(DispatchError::UnsupportedScheme(other.to_string())),
    }
}

/// Returns true when the value is a syntactically valid URL scheme.
fn is_scheme_token(value: &str) -> bool {
    let mut chars = value.chars();
    chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'))
}

/// Builds a client that connects only to the pinned addresses.
fn pinned_client(pinned: &PinnedDestination) -> Result<Client, DispatchError> {
    let mut builder = Client::builder().redirect(Policy::none()).no_proxy();
    if let Some(domain) = pinned.domain() {
        builder = builder.resolve_to_addrs(domain, &pinned.socket_addrs());
    }
    builder.build().map_err(|err| DispatchError::Internal(err.to_string()))
}

/// Maps transport failures to connection errors.
fn transport_error(err: reqwest::Error) -> DispatchError {
    DispatchError::ConnectionError(err.without_url().to_string())
}
