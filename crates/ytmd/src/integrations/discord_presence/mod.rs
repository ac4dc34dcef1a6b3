//! Rich presence showing the current track on the user's Discord profile.

mod activity;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use ytmd_host::Subscription;

pub use activity::{
    Activity, ActivityButton, ActivityKind, Assets, PresenceTracker, PresenceUpdate, Timestamps,
};

use crate::integrations::{Integration, IntegrationContext, IntegrationError};

const PRESENCE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::discord_presence");

/// Application id registered for the presence client.
pub const DISCORD_CLIENT_ID: &str = "1143202598460076053";

/// Memory-store flag raised while the presence client cannot connect.
pub const CONNECTION_FAILED_FLAG: &str = "discordPresenceConnectionFailed";

/// Errors raised by the presence client.
#[derive(Debug, Error)]
pub enum PresenceError {
    /// The presence service could not be reached.
    #[error("presence service unavailable: {reason}")]
    Unavailable {
        /// Reason reported by the transport.
        reason: String,
    },
    /// The presence service rejected a request.
    #[error("presence service rejected {operation}: {message}")]
    Rejected {
        /// Request that failed.
        operation: &'static str,
        /// Error text from the service.
        message: String,
    },
}

/// Transport to the local presence service.
pub trait PresenceClient: Send + Sync {
    /// Opens a connection for `client_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError`] when the service is unreachable.
    fn connect(&self, client_id: &str) -> Result<(), PresenceError>;

    /// Publishes `activity`.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError`] when the update is rejected.
    fn set_activity(&self, activity: &Activity) -> Result<(), PresenceError>;

    /// Removes the published activity.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError`] when the request is rejected.
    fn clear_activity(&self) -> Result<(), PresenceError>;

    /// Closes the connection.
    fn disconnect(&self);
}

/// Integration mirroring player state into rich presence.
pub struct DiscordPresence {
    context: IntegrationContext,
    client: Arc<dyn PresenceClient>,
    player_updates: Option<Subscription>,
}

impl DiscordPresence {
    /// Name reported to the manager.
    pub const NAME: &'static str = "DiscordPresence";

    /// Builds the integration over `client`.
    #[must_use]
    pub fn new(context: IntegrationContext, client: Arc<dyn PresenceClient>) -> Self {
        Self {
            context,
            client,
            player_updates: None,
        }
    }
}

fn apply(client: &dyn PresenceClient, update: PresenceUpdate) {
    let result = match update {
        PresenceUpdate::Set(activity) => client.set_activity(&activity),
        PresenceUpdate::Clear => client.clear_activity(),
        PresenceUpdate::Keep => return,
    };
    if let Err(error) = result {
        warn!(target: PRESENCE_TARGET, error = %error, "failed to update presence");
    }
}

#[async_trait]
impl Integration for DiscordPresence {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn gating_key(&self) -> &'static str {
        "integrations.discordPresenceEnabled"
    }

    fn on_enabled(&mut self) -> Result<(), IntegrationError> {
        let memory = self.context.memory_store()?;
        let player = self.context.player_state()?;
        if let Err(error) = self.client.connect(DISCORD_CLIENT_ID) {
            memory.set(CONNECTION_FAILED_FLAG, Value::Bool(true));
            return Err(error.into());
        }
        memory.set(CONNECTION_FAILED_FLAG, Value::Bool(false));
        debug!(target: PRESENCE_TARGET, "presence client connected");

        let tracker = Mutex::new(PresenceTracker::default());
        let client = Arc::clone(&self.client);
        self.player_updates = Some(player.subscribe(move |state| {
            let update = tracker
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .observe(state, SystemTime::now());
            apply(client.as_ref(), update);
        }));
        Ok(())
    }

    async fn on_disabled(&mut self) -> Result<(), IntegrationError> {
        self.player_updates.take();
        self.context
            .memory_store()?
            .set(CONNECTION_FAILED_FLAG, Value::Bool(false));
        self.client.disconnect();
        Ok(())
    }
}
