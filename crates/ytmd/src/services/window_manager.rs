//! Registry of the shell's native windows.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tracing::debug;
use ytmd_host::{Service, ServiceContext, ServiceDefinition, ServiceError};

const WINDOW_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::windows");

/// Name under which the main player window is registered.
pub const MAIN_WINDOW: &str = "Main";

/// Native window owned by the platform layer.
pub trait AppWindow: Send + Sync {
    /// Sends `payload` to the window's renderer on `channel`.
    fn ipc_broadcast(&self, channel: &str, payload: &Value);

    /// Restores, shows, and focuses the window.
    fn show_and_focus(&self);
}

/// Service tracking every open window by name.
#[derive(Default)]
pub struct WindowManager {
    windows: Mutex<Vec<(String, Arc<dyn AppWindow>)>>,
}

impl WindowManager {
    /// Registers `window` under `name`, returning the window it replaced.
    pub fn register_window(
        &self,
        name: impl Into<String>,
        window: Arc<dyn AppWindow>,
    ) -> Option<Arc<dyn AppWindow>> {
        let window_name = name.into();
        let mut windows = self.lock();
        debug!(target: WINDOW_TARGET, window = %window_name, "registering window");
        match windows.iter_mut().find(|(existing, _)| *existing == window_name) {
            Some((_, slot)) => Some(std::mem::replace(slot, window)),
            None => {
                windows.push((window_name, window));
                None
            }
        }
    }

    /// Removes the window registered under `name`.
    pub fn remove_window(&self, name: &str) -> Option<Arc<dyn AppWindow>> {
        let mut windows = self.lock();
        let position = windows.iter().position(|(existing, _)| existing == name)?;
        Some(windows.remove(position).1)
    }

    /// Window registered under `name`.
    #[must_use]
    pub fn get_window(&self, name: &str) -> Option<Arc<dyn AppWindow>> {
        self.lock()
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, window)| Arc::clone(window))
    }

    /// Returns `true` when a window is registered under `name`.
    #[must_use]
    pub fn has_window(&self, name: &str) -> bool {
        self.lock().iter().any(|(existing, _)| existing == name)
    }

    /// Every registered window in registration order.
    #[must_use]
    pub fn windows(&self) -> Vec<Arc<dyn AppWindow>> {
        self.lock()
            .iter()
            .map(|(_, window)| Arc::clone(window))
            .collect()
    }

    /// Sends `payload` to every registered window.
    pub fn broadcast(&self, channel: &str, payload: &Value) {
        for window in self.windows() {
            window.ipc_broadcast(channel, payload);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, Arc<dyn AppWindow>)>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Service for WindowManager {
    fn on_pre_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_post_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_terminated(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        self.lock().clear();
        Ok(())
    }
}

impl ServiceDefinition for WindowManager {
    const NAME: &'static str = "WindowManager";
}
