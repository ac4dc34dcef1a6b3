//! Collaborators used when the shell runs without a native UI.
//!
//! Windows log what they would render, the view accepts every request, global
//! shortcuts are unavailable, and the presence service is unreachable.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tracing::{debug, info};

use crate::integrations::{Activity, PresenceClient, PresenceError};
use crate::services::{
    AppWindow, ContentView, CssKey, ShortcutCallback, ShortcutError, ShortcutRegistrar, ViewError,
};

const HEADLESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::headless");

/// Window that logs broadcasts instead of rendering them.
#[derive(Debug, Default)]
pub struct LoggingWindow;

impl AppWindow for LoggingWindow {
    fn ipc_broadcast(&self, channel: &str, _payload: &Value) {
        debug!(target: HEADLESS_TARGET, channel, "window broadcast");
    }

    fn show_and_focus(&self) {
        info!(target: HEADLESS_TARGET, "main window focused");
    }
}

/// Content view that accepts every request.
#[derive(Debug, Default)]
pub struct HeadlessView {
    next_key: AtomicU64,
}

impl ContentView for HeadlessView {
    fn send(&self, channel: &str, _payload: &Value) -> Result<(), ViewError> {
        debug!(target: HEADLESS_TARGET, channel, "view message");
        Ok(())
    }

    fn insert_css(&self, css: &str) -> Result<CssKey, ViewError> {
        let key = self.next_key.fetch_add(1, Ordering::Relaxed);
        debug!(target: HEADLESS_TARGET, key, bytes = css.len(), "css inserted");
        Ok(CssKey(format!("headless-{key}")))
    }

    fn remove_inserted_css(&self, key: &CssKey) -> Result<(), ViewError> {
        debug!(target: HEADLESS_TARGET, key = %key.0, "css removed");
        Ok(())
    }
}

/// Shortcut registrar for platforms without global shortcuts.
#[derive(Debug, Default)]
pub struct HeadlessShortcutRegistrar;

impl ShortcutRegistrar for HeadlessShortcutRegistrar {
    fn unregister_all(&self) {}

    fn register(
        &self,
        accelerator: &str,
        _callback: ShortcutCallback,
    ) -> Result<bool, ShortcutError> {
        debug!(target: HEADLESS_TARGET, accelerator, "global shortcuts unavailable");
        Ok(false)
    }
}

/// Presence client with no service to talk to.
#[derive(Debug, Default)]
pub struct OfflinePresenceClient;

impl PresenceClient for OfflinePresenceClient {
    fn connect(&self, _client_id: &str) -> Result<(), PresenceError> {
        Err(PresenceError::Unavailable {
            reason: "no presence transport in headless mode".to_owned(),
        })
    }

    fn set_activity(&self, _activity: &Activity) -> Result<(), PresenceError> {
        Ok(())
    }

    fn clear_activity(&self) -> Result<(), PresenceError> {
        Ok(())
    }

    fn disconnect(&self) {}
}
