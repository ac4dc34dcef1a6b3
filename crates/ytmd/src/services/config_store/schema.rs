//! Typed defaults for the persisted settings tree.
//!
//! The store itself is an untyped `serde_json` tree so that renderer code can
//! address any dotted path; this schema only supplies the initial shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Complete settings document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSchema {
    /// Schema bookkeeping.
    pub metadata: Metadata,
    /// Start-up and window behaviour.
    pub general: General,
    /// Visual tweaks applied to the embedded player.
    pub appearance: Appearance,
    /// Playback behaviour.
    pub playback: Playback,
    /// Toggles for optional integrations.
    pub integrations: Integrations,
    /// Global shortcut accelerators; empty strings are unbound.
    pub shortcuts: Shortcuts,
    /// Window and session state written back by the state manager.
    pub state: WindowState,
    /// Scrobbling session data.
    pub lastfm: LastFm,
    /// Developer switches.
    pub developer: Developer,
}

impl StoreSchema {
    /// Renders the defaults as a settings tree.
    #[must_use]
    pub fn default_tree() -> Value {
        serde_json::to_value(Self::default()).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[expect(missing_docs, reason = "field names mirror the persisted keys")]
pub struct Metadata {
    pub version: u32,
}

impl Default for Metadata {
    fn default() -> Self {
        Self { version: 1 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[expect(missing_docs, reason = "field names mirror the persisted keys")]
pub struct General {
    pub disable_hardware_acceleration: bool,
    pub hide_to_tray_on_close: bool,
    pub show_notification_on_song_change: bool,
    pub start_on_boot: bool,
    pub start_minimized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[expect(missing_docs, reason = "field names mirror the persisted keys")]
pub struct Appearance {
    pub always_show_volume_slider: bool,
    #[serde(rename = "customCSSEnabled")]
    pub custom_css_enabled: bool,
    #[serde(rename = "customCSSPath")]
    pub custom_css_path: Option<String>,
    pub zoom: u32,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            always_show_volume_slider: false,
            custom_css_enabled: false,
            custom_css_path: None,
            zoom: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[expect(missing_docs, reason = "field names mirror the persisted keys")]
pub struct Playback {
    pub continue_where_you_left_off: bool,
    pub continue_where_you_left_off_paused: bool,
    pub enable_speaker_fill: bool,
    pub progress_in_taskbar: bool,
    pub ratio_volume: bool,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            continue_where_you_left_off: true,
            continue_where_you_left_off_paused: true,
            enable_speaker_fill: false,
            progress_in_taskbar: false,
            ratio_volume: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[expect(missing_docs, reason = "field names mirror the persisted keys")]
pub struct Integrations {
    pub companion_server_enabled: bool,
    pub companion_server_auth_tokens: Option<String>,
    #[serde(rename = "companionServerCORSWildcardEnabled")]
    pub companion_server_cors_wildcard_enabled: bool,
    pub discord_presence_enabled: bool,
    #[serde(rename = "lastFMEnabled")]
    pub last_fm_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[expect(missing_docs, reason = "field names mirror the persisted keys")]
pub struct Shortcuts {
    pub play_pause: String,
    pub next: String,
    pub previous: String,
    pub thumbs_up: String,
    pub thumbs_down: String,
    pub volume_up: String,
    pub volume_down: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[expect(missing_docs, reason = "field names mirror the persisted keys")]
pub struct WindowState {
    pub last_url: String,
    pub last_playlist_id: String,
    pub last_video_id: String,
    pub window_bounds: Option<Value>,
    pub window_maximized: bool,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            last_url: "https://music.youtube.com/".to_owned(),
            last_playlist_id: String::new(),
            last_video_id: String::new(),
            window_bounds: None,
            window_maximized: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[expect(missing_docs, reason = "field names mirror the persisted keys")]
pub struct LastFm {
    pub token: Option<String>,
    pub session_key: Option<String>,
    pub scrobble_percent: u8,
}

impl Default for LastFm {
    fn default() -> Self {
        Self {
            token: None,
            session_key: None,
            scrobble_percent: 50,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[expect(missing_docs, reason = "field names mirror the persisted keys")]
pub struct Developer {
    pub enable_dev_tools: bool,
}
