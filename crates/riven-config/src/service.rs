//! The runtime-held configuration handle.
//!
//! Configuration is an immutable snapshot read once at service start (see
//! [`crate::loader::load`]); no module reaches into a mutable global. When an
//! operator-triggered reload produces a new snapshot, [`ConfigService::reload`]
//! swaps it and broadcasts on [`ConfigService::subscribe`] so affected
//! components (the VFS host in particular) can re-run their own `sync()`.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::RwLock;

use tokio::sync::watch;

use crate::error::ConfigResult;
use crate::loader;
use crate::model::Settings;

/// Holds the current settings snapshot and notifies subscribers on reload.
pub struct ConfigService {
    config_path: Option<PathBuf>,
    current: RwLock<Arc<Settings>>,
    sync_tx: watch::Sender<()>,
}

impl ConfigService {
    /// Load the initial snapshot from `config_path` (optional TOML file) and
    /// environment overrides, layered over `defaults`.
    ///
    /// # Errors
    ///
    /// Returns an error if the layered configuration fails to parse or
    /// validate.
    pub fn load(config_path: Option<PathBuf>, defaults: &Settings) -> ConfigResult<Self> {
        let settings = loader::load(config_path.as_deref(), defaults)?;
        let (sync_tx, _rx) = watch::channel(());
        Ok(Self {
            config_path,
            current: RwLock::new(Arc::new(settings)),
            sync_tx,
        })
    }

    /// The current settings snapshot. Cheap: clones an `Arc`.
    #[must_use]
    pub fn current(&self) -> Arc<Settings> {
        self.current
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Re-read the configuration from disk/environment, replace the current
    /// snapshot, and notify subscribers. Subscribers read the new snapshot
    /// via [`ConfigService::current`]; the notification carries no payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the reloaded configuration fails to parse or
    /// validate; in that case the previous snapshot remains active.
    pub fn reload(&self, defaults: &Settings) -> ConfigResult<()> {
        let settings = loader::load(self.config_path.as_deref(), defaults)?;
        *self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Arc::new(settings);
        let _ = self.sync_tx.send(());
        Ok(())
    }

    /// Subscribe to reload notifications.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<()> {
        self.sync_tx.subscribe()
    }
}
