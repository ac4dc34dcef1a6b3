//! Optional, user-toggleable feature modules.
//!
//! Each integration is gated by one settings key and may list dependent keys
//! whose change forces a restart while it stays enabled. The
//! [`IntegrationManager`] owns every integration and reconciles their enabled
//! state against the settings tree.

mod context;
pub mod custom_css;
pub mod discord_presence;
mod error;
pub mod manager;
pub mod volume_ratio;

use std::sync::Arc;

use async_trait::async_trait;

pub use context::IntegrationContext;
pub use custom_css::CustomCss;
pub use discord_presence::{Activity, DiscordPresence, PresenceClient, PresenceError};
pub use error::IntegrationError;
pub use manager::{
    EnableFailure, IntegrationManager, IntegrationManagerError, ManagerHook,
};
pub use volume_ratio::VolumeRatio;

/// Optional feature module driven by the [`IntegrationManager`].
///
/// The manager holds each integration's enabled flag on its behalf, and the
/// enabled set is exactly the integrations whose flag is set; read it with
/// [`IntegrationManager::is_enabled`]. `on_enabled` runs after the flag is set
/// and `on_disabled` after it is cleared. Neither hook is ever called twice in
/// a row.
#[async_trait]
pub trait Integration: Send + 'static {
    /// Unique display name.
    fn name(&self) -> &'static str;

    /// Settings path whose truthiness enables the integration.
    fn gating_key(&self) -> &'static str;

    /// Settings paths whose change restarts the integration while enabled.
    ///
    /// A change touching several of these keys at once restarts the
    /// integration a single time.
    fn dependent_keys(&self) -> &'static [&'static str] {
        &[]
    }

    /// Runs once before the application is ready. The integration is not
    /// enabled yet and no window may exist.
    ///
    /// # Errors
    ///
    /// Any error aborts start-up.
    fn on_setup(&mut self) -> Result<(), IntegrationError> {
        Ok(())
    }

    /// Starts the integration. Asynchronous work may be spawned but is not
    /// awaited by the manager.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrationError`] when the integration cannot start; it is
    /// then reported and left disabled.
    fn on_enabled(&mut self) -> Result<(), IntegrationError>;

    /// Stops the integration and releases what `on_enabled` acquired.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrationError`] when teardown fails; the integration is
    /// still considered disabled.
    async fn on_disabled(&mut self) -> Result<(), IntegrationError>;
}

/// Constructor for one integration, bound to the manager's host.
pub type IntegrationFactory = Box<dyn FnOnce(IntegrationContext) -> Box<dyn Integration> + Send>;

/// Integrations shipped with the shell, in start-up order.
#[must_use]
pub fn default_integrations(presence: Arc<dyn PresenceClient>) -> Vec<IntegrationFactory> {
    vec![
        Box::new(move |context| Box::new(DiscordPresence::new(context, presence))),
        Box::new(|context| Box::new(VolumeRatio::new(context))),
        Box::new(|context| Box::new(CustomCss::new(context))),
    ]
}
