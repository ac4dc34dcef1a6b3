//! Controller for the embedded music player view.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};
use ytmd_host::{
    InitializationGuard, Service, ServiceContext, ServiceDefinition, ServiceError, Subscribers,
    Subscription,
};

use crate::services::WindowManager;

const VIEW_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::ytm_view");

/// Channel carrying remote-control commands to the player.
pub const REMOTE_EXECUTE_CHANNEL: &str = "remoteControl:execute";

/// Channel carrying raw scripts to the player.
pub const REMOTE_SCRIPT_CHANNEL: &str = "remoteControl:executeScript";

/// Errors raised by the content view.
#[derive(Debug, Error)]
pub enum ViewError {
    /// No view has been attached yet.
    #[error("no content view is attached")]
    NoView,
    /// The readiness signal was dropped.
    #[error("content view readiness signal closed")]
    Closed,
    /// The platform view rejected the operation.
    #[error("content view rejected {operation}: {message}")]
    Rejected {
        /// Operation that failed.
        operation: &'static str,
        /// Platform error text.
        message: String,
    },
}

/// Handle identifying CSS inserted into the view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CssKey(pub String);

/// Platform web view hosting the player.
pub trait ContentView: Send + Sync {
    /// Sends `payload` to the player renderer on `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Rejected`] when the view cannot deliver it.
    fn send(&self, channel: &str, payload: &Value) -> Result<(), ViewError>;

    /// Injects `css` and returns the key needed to remove it.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Rejected`] when the view refuses the stylesheet.
    fn insert_css(&self, css: &str) -> Result<CssKey, ViewError>;

    /// Removes CSS previously inserted under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Rejected`] when the view refuses the removal.
    fn remove_inserted_css(&self, key: &CssKey) -> Result<(), ViewError>;

    /// Whether the page finished loading when the view was attached.
    fn is_loaded(&self) -> bool {
        true
    }
}

/// Service owning the current content view and its readiness.
pub struct YtmViewManager {
    view: Mutex<Option<Arc<dyn ContentView>>>,
    ready: watch::Sender<bool>,
    recreated: Subscribers<()>,
    guard: InitializationGuard,
}

impl YtmViewManager {
    /// Builds a manager with no view attached.
    #[must_use]
    pub fn new() -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            view: Mutex::new(None),
            ready,
            recreated: Subscribers::new(),
            guard: InitializationGuard::new(),
        }
    }

    /// Attaches `view`, replacing any previous one.
    ///
    /// Replacing a view emits `view-recreated` after the swap.
    pub fn attach_view(&self, view: Arc<dyn ContentView>) {
        let loaded = view.is_loaded();
        let replaced = self
            .view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(view)
            .is_some();
        self.ready.send_replace(loaded);
        if replaced {
            info!(target: VIEW_TARGET, "content view recreated");
            self.recreated.emit(&());
        }
    }

    /// Marks the current view as loaded or unloaded.
    pub fn set_ready(&self, ready: bool) {
        debug!(target: VIEW_TARGET, ready, "content view readiness changed");
        self.ready.send_replace(ready);
    }

    /// Returns `true` while the current view is loaded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Resolves once the current view is loaded.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Closed`] if the readiness signal is dropped.
    pub async fn ready(&self) -> Result<(), ViewError> {
        let mut receiver = self.ready.subscribe();
        receiver
            .wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|_| ViewError::Closed)
    }

    /// Current view.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::NoView`] before a view is attached.
    pub fn view(&self) -> Result<Arc<dyn ContentView>, ViewError> {
        self.view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ViewError::NoView)
    }

    /// Runs `script` inside the player.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] when no view is attached or delivery fails.
    pub fn execute_script(&self, script: &str) -> Result<(), ViewError> {
        self.view()?.send(REMOTE_SCRIPT_CHANNEL, &Value::from(script))
    }

    /// Sends a remote-control `command` with optional `argument`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] when no view is attached or delivery fails.
    pub fn execute_remote_command(
        &self,
        command: &str,
        argument: Option<Value>,
    ) -> Result<(), ViewError> {
        let payload = match argument {
            Some(value) => json!([command, value]),
            None => json!([command]),
        };
        self.view()?.send(REMOTE_EXECUTE_CHANNEL, &payload)
    }

    /// Subscribes to `view-recreated` notifications.
    #[must_use = "dropping the subscription removes the listener"]
    pub fn on_view_recreated<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.recreated.subscribe(move |_: &()| listener())
    }

    /// Returns `true` once the service finished initialisation.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.guard.is_initialized()
    }
}

impl Default for YtmViewManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for YtmViewManager {
    fn on_pre_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        self.guard.mark(Self::NAME)?;
        Ok(())
    }

    fn on_post_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_terminated(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        self.ready.send_replace(false);
        Ok(())
    }
}

impl ServiceDefinition for YtmViewManager {
    const NAME: &'static str = "YtmViewManager";
    const DEPENDENCIES: &'static [&'static str] = &[WindowManager::NAME];
}
