// crates/action-relay-config/src/handle.rs
// ============================================================================
// Module: Config Handle
// Description: Live, reloadable source of dispatch settings snapshots.
// Purpose: Swap settings atomically without disturbing in-flight dispatches.
// Dependencies: action-relay-core, tracing
// ============================================================================

//! ## Overview
//! [`ConfigHandle`] holds the current [`DispatchSettings`] behind an
//! `RwLock<Arc<_>>`. Each dispatch clones the `Arc` once; a reload swaps the
//! pointer, so snapshots already handed out keep their original values.
//! A failed reload leaves the current snapshot in place.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use action_relay_core::DispatchSettings;
use action_relay_core::SettingsSource;
use tracing::info;
use tracing::warn;

use crate::config::ConfigError;
use crate::config::RelayConfig;

// ============================================================================
// SECTION: Handle
// ============================================================================

/// Reloadable dispatch settings source.
#[derive(Debug)]
pub struct ConfigHandle {
    /// Config file reloaded by [`ConfigHandle::reload`].
    path: Option<PathBuf>,
    /// Current settings snapshot.
    current: RwLock<Arc<DispatchSettings>>,
}

impl ConfigHandle {
    /// Creates a handle serving fixed settings with no backing file.
    #[must_use]
    pub fn new(settings: DispatchSettings) -> Self {
        Self {
            path: None,
            current: RwLock::new(Arc::new(settings)),
        }
    }

    /// Loads the config file and returns the handle with the parsed config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: &Path) -> Result<(Self, RelayConfig), ConfigError> {
        let config = RelayConfig::load(Some(path))?;
        let handle = Self {
            path: Some(path.to_path_buf()),
            current: RwLock::new(Arc::new(config.dispatch_settings()?)),
        };
        Ok((handle, config))
    }

    /// Re-reads the backing file and swaps in the new settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the handle has no file or the new config
    /// is invalid; the current snapshot is kept in that case.
    pub fn reload(&self) -> Result<Arc<DispatchSettings>, ConfigError> {
        let Some(path) = &self.path else {
            return Err(ConfigError::Invalid("config handle has no backing file".to_string()));
        };
        let settings = RelayConfig::load(Some(path))
            .and_then(|config| config.dispatch_settings())
            .inspect_err(|err| warn!(error = %err, "config reload rejected"))?;
        info!(path = %path.display(), "config reloaded");
        Ok(self.replace(settings))
    }

    /// Swaps in new settings and returns the new snapshot.
    pub fn replace(&self, settings: DispatchSettings) -> Arc<DispatchSettings> {
        let next = Arc::new(settings);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::clone(&next);
        drop(guard);
        next
    }
}

impl SettingsSource for ConfigHandle {
    fn snapshot(&self) -> Arc<DispatchSettings> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }
}
