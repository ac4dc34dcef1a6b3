//! Shared snapshot of what the embedded player is doing.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use ytmd_host::{
    Service, ServiceContext, ServiceDefinition, ServiceError, Subscribers, Subscription,
};

/// Playback state reported by the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VideoState {
    /// The player has not reported a state.
    #[default]
    Unknown,
    /// Playback is paused.
    Paused,
    /// Playback is running.
    Playing,
    /// Playback is waiting for data.
    Buffering,
}

/// Thumbnail rendition of the current track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    /// Image URL.
    pub url: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Metadata of the current track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    /// Video identifier.
    pub id: String,
    /// Track title.
    pub title: String,
    /// Artist or channel.
    pub author: String,
    /// Album name, when known.
    pub album: Option<String>,
    /// Available thumbnails.
    pub thumbnails: Vec<Thumbnail>,
    /// Track length in seconds.
    pub duration_seconds: u64,
}

/// Player state snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Current track, if any.
    pub video_details: Option<VideoDetails>,
    /// Playback position in seconds.
    pub video_progress: f64,
    /// Playback state.
    pub track_state: VideoState,
    /// Whether every metadata field has been resolved.
    pub has_full_metadata: bool,
}

impl PlayerState {
    /// Playback position, clamped to zero for invalid reports.
    #[must_use]
    pub fn progress(&self) -> Duration {
        Duration::try_from_secs_f64(self.video_progress).unwrap_or_default()
    }
}

/// Service publishing player state to integrations.
#[derive(Default)]
pub struct PlayerStateStore {
    state: Mutex<PlayerState>,
    listeners: Subscribers<PlayerState>,
}

impl PlayerStateStore {
    /// Latest snapshot.
    #[must_use]
    pub fn state(&self) -> PlayerState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the snapshot and notifies listeners.
    pub fn update(&self, state: PlayerState) {
        (*self.state.lock().unwrap_or_else(PoisonError::into_inner)).clone_from(&state);
        self.listeners.emit(&state);
    }

    /// Subscribes to snapshot updates.
    #[must_use = "dropping the subscription removes the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&PlayerState) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }
}

impl Service for PlayerStateStore {
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
        Ok(())
    }
}

impl ServiceDefinition for PlayerStateStore {
    const NAME: &'static str = "PlayerStateStore";
}
