//! Rich-presence activity built from player state.

use std::time::{Duration, SystemTime};

use crate::services::{PlayerState, Thumbnail, VideoDetails, VideoState};

const TEXT_LIMIT: usize = 128;
const TEXT_MINIMUM: usize = 2;
const IMAGE_URL_LIMIT: usize = 256;
const FALLBACK_IMAGE: &str = "ytmd-logo";
const ZERO_WIDTH_SPACE: char = '\u{200B}';
const ELLIPSIS: &str = "...";

/// Kind of activity shown on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    /// "Listening to ..."
    Listening,
}

/// Start and end of the current track, present only while playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamps {
    /// When the track started.
    pub start: SystemTime,
    /// When the track will end.
    pub end: SystemTime,
}

/// Images and hover texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assets {
    /// Album art URL or the fallback image key.
    pub large_image: String,
    /// Album name.
    pub large_text: Option<String>,
    /// Play or pause badge key.
    pub small_image: &'static str,
    /// Play or pause badge text.
    pub small_text: &'static str,
}

/// Link button attached to the activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityButton {
    /// Button caption.
    pub label: &'static str,
    /// Target URL.
    pub url: String,
}

/// Activity pushed to the presence client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    /// Activity kind.
    pub kind: ActivityKind,
    /// First line: track title.
    pub details: String,
    /// Second line: artist.
    pub state: String,
    /// Track timing.
    pub timestamps: Option<Timestamps>,
    /// Images.
    pub assets: Assets,
    /// Link buttons.
    pub buttons: Vec<ActivityButton>,
}

impl Activity {
    /// Builds the activity for `details` at `progress`, as observed at `now`.
    #[must_use]
    pub fn for_track(
        details: &VideoDetails,
        track_state: VideoState,
        progress: Duration,
        now: SystemTime,
    ) -> Self {
        let playing = track_state == VideoState::Playing;
        let timestamps = playing
            .then(|| {
                let remaining =
                    Duration::from_secs(details.duration_seconds).saturating_sub(progress);
                Some(Timestamps {
                    start: now.checked_sub(progress)?,
                    end: now.checked_add(remaining)?,
                })
            })
            .flatten();
        let large_image = largest_thumbnail(&details.thumbnails)
            .map(|thumbnail| thumbnail.url.as_str())
            .filter(|url| url.len() <= IMAGE_URL_LIMIT)
            .unwrap_or(FALLBACK_IMAGE)
            .to_owned();

        Self {
            kind: ActivityKind::Listening,
            details: string_limit(&details.title),
            state: string_limit(&details.author),
            timestamps,
            assets: Assets {
                large_image,
                large_text: details.album.as_deref().map(string_limit),
                small_image: if playing { "play-border" } else { "pause-border" },
                small_text: if playing { "Playing" } else { "Paused" },
            },
            buttons: vec![
                ActivityButton {
                    label: "Play on YouTube Music",
                    url: format!("https://music.youtube.com/watch?v={}", details.id),
                },
                ActivityButton {
                    label: "Play on YouTube Music Desktop",
                    url: format!("ytmd://play/{}", details.id),
                },
            ],
        }
    }
}

fn largest_thumbnail(thumbnails: &[Thumbnail]) -> Option<&Thumbnail> {
    thumbnails
        .iter()
        .max_by_key(|thumbnail| u64::from(thumbnail.width) * u64::from(thumbnail.height))
}

/// Truncates to the text limit with an ellipsis and pads short text with
/// zero-width spaces, counting characters rather than bytes.
pub(super) fn string_limit(text: &str) -> String {
    let length = text.chars().count();
    if length > TEXT_LIMIT {
        let kept: String = text.chars().take(TEXT_LIMIT - ELLIPSIS.len()).collect();
        return format!("{}{ELLIPSIS}", kept.trim());
    }
    let mut limited = text.to_owned();
    limited.extend(std::iter::repeat_n(
        ZERO_WIDTH_SPACE,
        TEXT_MINIMUM.saturating_sub(length),
    ));
    limited
}

/// What the presence client should do after a player update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceUpdate {
    /// Publish a new activity.
    Set(Box<Activity>),
    /// Remove the activity.
    Clear,
    /// Leave the current activity in place.
    Keep,
}

/// Tracks the last published track to suppress redundant updates.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    track_state: Option<VideoState>,
    video_id: Option<String>,
    progress_secs: Option<u64>,
}

impl PresenceTracker {
    /// Folds `state` into the tracker and returns the required update.
    ///
    /// An activity is published only once metadata is complete and the play
    /// state, the track, or the position changed. Position changes count when
    /// playback jumped more than a second or went backwards.
    pub fn observe(&mut self, state: &PlayerState, now: SystemTime) -> PresenceUpdate {
        let Some(details) = state.video_details.as_ref() else {
            return PresenceUpdate::Clear;
        };
        let progress = state.progress();
        let progress_secs = progress.as_secs();

        let state_changed = self.track_state.replace(state.track_state) != Some(state.track_state);
        let track_changed =
            self.video_id.replace(details.id.clone()).as_deref() != Some(details.id.as_str());
        let position_changed = self
            .progress_secs
            .replace(progress_secs)
            .is_none_or(|previous| {
                previous.abs_diff(progress_secs) > 1 || previous > progress_secs
            });

        if state.has_full_metadata && (state_changed || track_changed || position_changed) {
            PresenceUpdate::Set(Box::new(Activity::for_track(
                details,
                state.track_state,
                Duration::from_secs(progress_secs),
                now,
            )))
        } else {
            PresenceUpdate::Keep
        }
    }
}
