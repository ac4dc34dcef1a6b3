//! Host access for integrations.

use std::sync::Arc;

use tracing::warn;
use ytmd_host::HostHandle;

use crate::integrations::IntegrationError;
use crate::services::{ConfigStore, MemoryStore, PlayerStateStore, YtmViewManager};

const CONTEXT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::integrations");

/// Handle through which an integration reaches hosted services.
///
/// Holds only a weak host reference, so integrations never keep the host
/// alive.
#[derive(Debug, Clone)]
pub struct IntegrationContext {
    host: HostHandle,
}

impl IntegrationContext {
    /// Binds a context to `host`.
    #[must_use]
    pub const fn new(host: HostHandle) -> Self {
        Self { host }
    }

    /// Settings store.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrationError::Service`] when the host is gone.
    pub fn config_store(&self) -> Result<Arc<ConfigStore>, IntegrationError> {
        Ok(self.host.get_service::<ConfigStore>()?)
    }

    /// Embedded player view controller.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrationError::Service`] when the host is gone.
    pub fn ytm_view(&self) -> Result<Arc<YtmViewManager>, IntegrationError> {
        Ok(self.host.get_service::<YtmViewManager>()?)
    }

    /// Volatile renderer state.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrationError::Service`] when the host is gone.
    pub fn memory_store(&self) -> Result<Arc<MemoryStore>, IntegrationError> {
        Ok(self.host.get_service::<MemoryStore>()?)
    }

    /// Player state publisher.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrationError::Service`] when the host is gone.
    pub fn player_state(&self) -> Result<Arc<PlayerStateStore>, IntegrationError> {
        Ok(self.host.get_service::<PlayerStateStore>()?)
    }

    /// Runs `script` inside the player.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrationError`] when the view is unavailable.
    pub fn execute_ytm_script(&self, script: &str) -> Result<(), IntegrationError> {
        self.ytm_view()?.execute_script(script)?;
        Ok(())
    }

    /// Runs `action` now if the player view is ready, otherwise once it
    /// becomes ready.
    ///
    /// Deferred actions are spawned on the current tokio runtime and are not
    /// awaited; without a runtime the action is dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrationError`] when the view manager is unavailable or
    /// an immediate `action` fails.
    pub fn when_view_ready<F>(&self, action: F) -> Result<(), IntegrationError>
    where
        F: FnOnce(&YtmViewManager) -> Result<(), IntegrationError> + Send + 'static,
    {
        let view = self.ytm_view()?;
        if view.is_ready() {
            return action(&view);
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(target: CONTEXT_TARGET, "player view not ready and no runtime to wait on");
            return Ok(());
        };
        runtime.spawn(async move {
            if view.ready().await.is_ok() {
                if let Err(error) = action(&view) {
                    warn!(target: CONTEXT_TARGET, error = %error, "deferred view action failed");
                }
            }
        });
        Ok(())
    }
}
