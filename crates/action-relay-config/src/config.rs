// crates/action-relay-config/src/config.rs
// ============================================================================
// Module: Action Relay Configuration
// Description: Configuration loading and validation for the action relay.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: action-relay-broker, action-relay-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed; callers never see a
//! partially validated [`RelayConfig`].
//! Security posture: config inputs are untrusted; see `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use action_relay_broker::DEFAULT_TRIGGER_MAX_ENTRIES;
use action_relay_broker::DEFAULT_TRIGGER_TTL;
use action_relay_broker::DispatchAuditSink;
use action_relay_broker::FileAuditSink;
use action_relay_broker::NoopAuditSink;
use action_relay_broker::StderrAuditSink;
use action_relay_broker::TriggerSettings;
use action_relay_core::AllowList;
use action_relay_core::DEFAULT_MAX_RESPONSE_BYTES;
use action_relay_core::DispatchSettings;
use action_relay_core::effective_timeout;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "action-relay.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "ACTION_RELAY_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of allow-list entries.
pub(crate) const MAX_ALLOW_LIST_ENTRIES: usize = 256;
/// Shortest accepted trigger TTL in milliseconds.
pub const MIN_TRIGGER_TTL_MS: u64 = 100;
/// Longest accepted trigger TTL in milliseconds.
pub const MAX_TRIGGER_TTL_MS: u64 = 10 * 60 * 1000;
/// Largest accepted trigger store capacity.
pub const MAX_TRIGGER_ENTRIES: usize = 1 << 20;
/// Largest accepted response body cap.
pub const MAX_RESPONSE_BYTES_LIMIT: usize = 64 * 1024 * 1024;

// ============================================================================
// SECTION: Relay Config
// ============================================================================

/// Action relay configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Outbound dispatch configuration.
    #[serde(default)]
    pub service: ServiceConfig,
    /// Trigger token store configuration.
    #[serde(default)]
    pub trigger: TriggerConfig,
    /// Dispatch audit configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl RelayConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path is taken from the argument, then `ACTION_RELAY_CONFIG`, then
    /// `action-relay.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.service.validate()?;
        self.trigger.validate()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Builds the dispatch settings snapshot for this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the allow-list cannot be parsed.
    pub fn dispatch_settings(&self) -> Result<DispatchSettings, ConfigError> {
        self.service.to_settings()
    }

    /// Returns the trigger store settings.
    #[must_use]
    pub const fn trigger_settings(&self) -> TriggerSettings {
        self.trigger.to_settings()
    }

    /// Opens the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the audit file cannot be opened.
    pub fn audit_sink(&self) -> Result<Arc<dyn DispatchAuditSink>, ConfigError> {
        self.audit.open_sink()
    }
}

// ============================================================================
// SECTION: Service Config
// ============================================================================

/// Outbound dispatch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Public site URL used to anchor relative action URLs.
    #[serde(default)]
    pub site_url: String,
    /// Internal destinations integrations may reach (hosts, IPs, CIDRs).
    #[serde(default)]
    pub allowed_untrusted_internal_connections: Vec<String>,
    /// Outbound deadline in seconds; absent or non-positive uses the default.
    #[serde(default)]
    pub outgoing_integration_requests_timeout: Option<i64>,
    /// Maximum accepted response body size in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            site_url: String::new(),
            allowed_untrusted_internal_connections: Vec::new(),
            outgoing_integration_requests_timeout: None,
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

impl ServiceConfig {
    /// Validates service configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_site_url(&self.site_url)?;
        if self.allowed_untrusted_internal_connections.len() > MAX_ALLOW_LIST_ENTRIES {
            return Err(ConfigError::Invalid(
                "service.allowed_untrusted_internal_connections has too many entries".to_string(),
            ));
        }
        self.allow_list()?;
        if self.max_response_bytes == 0 || self.max_response_bytes > MAX_RESPONSE_BYTES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "service.max_response_bytes must be between 1 and {MAX_RESPONSE_BYTES_LIMIT}"
            )));
        }
        Ok(())
    }

    /// Parses the allow-list entries.
    fn allow_list(&self) -> Result<AllowList, ConfigError> {
        AllowList::from_entries(&self.allowed_untrusted_internal_connections).map_err(|err| {
            ConfigError::Invalid(format!("service.allowed_untrusted_internal_connections: {err}"))
        })
    }

    /// Converts the section into a dispatch settings snapshot.
    fn to_settings(&self) -> Result<DispatchSettings, ConfigError> {
        Ok(DispatchSettings {
            site_url: self.site_url.trim().to_string(),
            allow_list: self.allow_list()?,
            timeout: effective_timeout(self.outgoing_integration_requests_timeout),
            max_response_bytes: self.max_response_bytes,
        })
    }
}

// ============================================================================
// SECTION: Trigger Config
// ============================================================================

/// Trigger token store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Token lifetime in milliseconds.
    #[serde(default = "default_trigger_ttl_ms")]
    pub ttl_ms: u64,
    /// Maximum number of outstanding tokens.
    #[serde(default = "default_trigger_max_entries")]
    pub max_entries: usize,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_trigger_ttl_ms(),
            max_entries: default_trigger_max_entries(),
        }
    }
}

impl TriggerConfig {
    /// Validates trigger configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_TRIGGER_TTL_MS ..= MAX_TRIGGER_TTL_MS).contains(&self.ttl_ms) {
            return Err(ConfigError::Invalid(format!(
                "trigger.ttl_ms must be between {MIN_TRIGGER_TTL_MS} and {MAX_TRIGGER_TTL_MS}"
            )));
        }
        if self.max_entries == 0 || self.max_entries > MAX_TRIGGER_ENTRIES {
            return Err(ConfigError::Invalid(format!(
                "trigger.max_entries must be between 1 and {MAX_TRIGGER_ENTRIES}"
            )));
        }
        Ok(())
    }

    /// Converts the section into trigger store settings.
    const fn to_settings(&self) -> TriggerSettings {
        TriggerSettings {
            ttl: Duration::from_millis(self.ttl_ms),
            max_entries: self.max_entries,
        }
    }
}

// ============================================================================
// SECTION: Audit Config
// ============================================================================

/// Audit sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// Discard audit events.
    None,
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
}

/// Dispatch audit configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Sink selection.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Audit file path; required for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (&self.sink, &self.path) {
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
            (AuditSinkKind::File, Some(path)) => validate_path(path),
            _ => Ok(()),
        }
    }

    /// Opens the configured sink.
    fn open_sink(&self) -> Result<Arc<dyn DispatchAuditSink>, ConfigError> {
        match (&self.sink, &self.path) {
            (AuditSinkKind::None, _) => Ok(Arc::new(NoopAuditSink)),
            (AuditSinkKind::Stderr, _) => Ok(Arc::new(StderrAuditSink)),
            (AuditSinkKind::File, Some(path)) => FileAuditSink::new(path)
                .map(|sink| Arc::new(sink) as Arc<dyn DispatchAuditSink>)
                .map_err(|err| ConfigError::Io(err.to_string())),
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates a path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates the site URL: empty, or an absolute http(s) URL without
/// credentials, query, or fragment.
fn validate_site_url(site_url: &str) -> Result<(), ConfigError> {
    let trimmed = site_url.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    let url = Url::parse(trimmed)
        .map_err(|err| ConfigError::Invalid(format!("service.site_url is invalid: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(
            "service.site_url must use http:// or https://".to_string(),
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::Invalid("service.site_url must include a host".to_string()));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(ConfigError::Invalid(
            "service.site_url must not include credentials".to_string(),
        ));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::Invalid(
            "service.site_url must not include a query or fragment".to_string(),
        ));
    }
    Ok(())
}

/// Default response body cap.
pub(crate) const fn default_max_response_bytes() -> usize {
    DEFAULT_MAX_RESPONSE_BYTES
}

/// Default trigger TTL in milliseconds.
pub(crate) const fn default_trigger_ttl_ms() -> u64 {
    DEFAULT_TRIGGER_TTL.as_secs().saturating_mul(1000)
}

/// Default trigger store capacity.
pub(crate) const fn default_trigger_max_entries() -> usize {
    DEFAULT_TRIGGER_MAX_ENTRIES
}
