// crates/action-relay-core/tests/resolver.rs
// ============================================================================
// Module: Action URL Resolver Tests
// Description: Tests for plugin, absolute, and site-relative URL resolution.
// ============================================================================
//! ## Overview
//! Validates that action URLs classify into plugin-local or network targets
//! independent of slashes, schemes, and the configured site URL.

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

use action_relay_core::MAX_ACTION_URL_BYTES;
use action_relay_core::ResolveError;
use action_relay_core::ResolvedTarget;
use action_relay_core::resolve_action_url;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn plugin(raw: &str, site_url: &str) -> (String, String, String) {
    match resolve_action_url(raw, site_url).expect("resolve") {
        ResolvedTarget::PluginLocal(route) => (
            route.plugin_id().to_string(),
            route.path().to_string(),
            route.query().to_string(),
        ),
        ResolvedTarget::Network(target) => panic!("expected plugin target, got {target:?}"),
    }
}

fn network(raw: &str, site_url: &str) -> String {
    match resolve_action_url(raw, site_url).expect("resolve") {
        ResolvedTarget::Network(target) => target.as_str().to_string(),
        ResolvedTarget::PluginLocal(route) => panic!("expected network target, got {route:?}"),
    }
}

// ============================================================================
// SECTION: Plugin Paths
// ============================================================================

#[test]
fn plugin_paths_resolve_regardless_of_slashes_and_site_url() {
    let variants = [
        "plugins/myplugin/myaction",
        "/plugins/myplugin/myaction",
        "//plugins//myplugin///myaction",
        "///plugins/myplugin/myaction",
    ];
    for site_url in ["", "http://localhost:8065", "https://chat.example.com/sub"] {
        for raw in variants {
            let (id, path, query) = plugin(raw, site_url);
            assert_eq!(id, "myplugin", "{raw} with site {site_url}");
            assert_eq!(path, "/myaction", "{raw} with site {site_url}");
            assert_eq!(query, "");
        }
    }
}

#[test]
fn plugin_path_without_rest_targets_root() {
    let (id, path, _) = plugin("/plugins/myplugin", "");
    assert_eq!(id, "myplugin");
    assert_eq!(path, "/");
}

#[test]
fn plugin_path_keeps_query_and_drops_fragment() {
    let (id, path, query) = plugin("/plugins/myplugin/myaction?param=1#frag", "");
    assert_eq!(id, "myplugin");
    assert_eq!(path, "/myaction");
    assert_eq!(query, "param=1");
}

#[test]
fn plugin_path_keeps_nested_rest() {
    let (_, path, _) = plugin("plugins/com.example.demo/api/v1/dialog", "");
    assert_eq!(path, "/api/v1/dialog");
}

#[test]
fn absolute_url_with_site_prefix_is_plugin_local() {
    let (id, path, query) =
        plugin("https://chat.example.com/plugins/myplugin/myaction?x=1", "https://chat.example.com/");
    assert_eq!(id, "myplugin");
    assert_eq!(path, "/myaction");
    assert_eq!(query, "x=1");
}

#[test]
fn absolute_url_to_other_host_stays_on_network() {
    let url = network("https://other.example.com/plugins/myplugin/myaction", "https://chat.example.com");
    assert_eq!(url, "https://other.example.com/plugins/myplugin/myaction");
}

#[test]
fn site_prefix_matches_whole_segments_only() {
    let url = network("https://chat.example.com/subway/plugins/p/a", "https://chat.example.com/sub");
    assert_eq!(url, "https://chat.example.com/subway/plugins/p/a");
}

#[test]
fn empty_plugin_id_is_not_plugin_local() {
    let url = network("/plugins//", "http://localhost");
    assert_eq!(url, "http://localhost/plugins/");
}

#[test]
fn similar_prefix_is_not_plugin_local() {
    let url = network("/pluginsx/myplugin/a", "http://localhost");
    assert_eq!(url, "http://localhost/pluginsx/myplugin/a");
}

#[test]
fn dot_segments_cannot_escape_the_plugin_root() {
    let url = network("/plugins/../api/v4/system/ping", "https://chat.example.com");
    assert_eq!(url, "https://chat.example.com/api/v4/system/ping");
    let url = network("/plugins/myplugin/../../api/v4/users/me", "https://chat.example.com");
    assert_eq!(url, "https://chat.example.com/api/v4/users/me");
    let url = network("/plugins/./../api", "https://chat.example.com");
    assert_eq!(url, "https://chat.example.com/api");
}

#[test]
fn dot_segments_fold_before_plugin_match() {
    let (id, path, _) = plugin("./plugins/p/a", "");
    assert_eq!(id, "p");
    assert_eq!(path, "/a");
    let (id, path, query) = plugin("/hooks/../plugins/p/x/./y/../z?k=v", "https://chat.example.com");
    assert_eq!(id, "p");
    assert_eq!(path, "/x/z");
    assert_eq!(query, "k=v");
}

#[test]
fn dot_segments_never_become_plugin_ids() {
    for raw in ["/plugins/..", "/plugins/.", "/plugins/../", "plugins/p/../.."] {
        assert!(
            matches!(
                resolve_action_url(raw, "http://localhost").expect("resolve"),
                ResolvedTarget::Network(_)
            ),
            "{raw} must not resolve to a plugin"
        );
    }
}

#[test]
fn site_prefixed_dot_segments_fall_back_to_network() {
    let raw = "https://chat.example.com/plugins/myplugin/../../api/v4/users/me";
    assert_eq!(network(raw, "https://chat.example.com"), raw);
}

#[test]
fn relative_dot_segments_stay_under_site_root() {
    let url = network("/../../hooks/./abc/", "https://chat.example.com/subpath");
    assert_eq!(url, "https://chat.example.com/subpath/hooks/abc/");
}

// ============================================================================
// SECTION: Network Targets
// ============================================================================

#[test]
fn absolute_urls_pass_through_unmodified() {
    let url = network("http://127.0.0.1:9000//hook?a=1#b", "https://chat.example.com");
    assert_eq!(url, "http://127.0.0.1:9000//hook?a=1#b");
}

#[test]
fn malformed_scheme_still_resolves() {
    assert_eq!(network(":test", ""), ":test");
    assert_eq!(network(":test", "http://localhost"), ":test");
}

#[test]
fn host_port_without_scheme_is_treated_as_scheme_url() {
    assert_eq!(network("localhost:8065/hook", ""), "localhost:8065/hook");
}

#[test]
fn relative_path_is_anchored_on_site_url() {
    let url = network("/hooks//action?x=1", "http://localhost:8065/");
    assert_eq!(url, "http://localhost:8065/hooks/action?x=1");
}

#[test]
fn relative_path_is_anchored_on_subpath_site_url() {
    let url = network("api/v4/hook", "https://chat.example.com/subpath");
    assert_eq!(url, "https://chat.example.com/subpath/api/v4/hook");
    let unaware = network("/subpath-less/hook", "https://chat.example.com/subpath");
    assert_eq!(unaware, "https://chat.example.com/subpath/subpath-less/hook");
}

#[test]
fn relative_path_without_site_url_fails() {
    let err = resolve_action_url("/hooks/action", "").unwrap_err();
    assert_eq!(err, ResolveError::MissingSiteUrl);
}

#[test]
fn empty_and_oversized_urls_fail() {
    assert_eq!(resolve_action_url("", "http://localhost").unwrap_err(), ResolveError::Empty);
    assert_eq!(resolve_action_url("   ", "http://localhost").unwrap_err(), ResolveError::Empty);
    let oversized = format!("/hooks/{}", "a".repeat(MAX_ACTION_URL_BYTES));
    assert_eq!(
        resolve_action_url(&oversized, "http://localhost").unwrap_err(),
        ResolveError::TooLong
    );
}

#[test]
fn resolution_is_pure() {
    let first = resolve_action_url("/plugins/p/a?b=c", "http://localhost").expect("first");
    let second = resolve_action_url("/plugins/p/a?b=c", "http://localhost").expect("second");
    assert_eq!(first, second);
    assert_eq!(first.kind(), "plugin");
}
