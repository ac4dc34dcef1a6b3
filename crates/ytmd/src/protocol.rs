//! Deep links of the form `ytmd://play/<videoId>/<playlistId>`.

use serde_json::{Value, json};

/// Action requested by a deep link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolAction {
    /// Start playing a video, optionally inside a playlist.
    Play {
        /// Video to play.
        video_id: String,
        /// Playlist context, when given.
        playlist_id: Option<String>,
    },
}

impl ProtocolAction {
    /// Parses `url`; anything unrecognised yields `None`.
    #[must_use]
    pub fn parse(url: &str) -> Option<Self> {
        let (_, rest) = url.split_once("://")?;
        let mut segments = rest.split('/');
        match segments.next()? {
            "play" => {
                let video_id = segments.next().filter(|id| !id.is_empty())?;
                let playlist_id = segments.next().filter(|id| !id.is_empty());
                Some(Self::Play {
                    video_id: video_id.to_owned(),
                    playlist_id: playlist_id.map(str::to_owned),
                })
            }
            _ => None,
        }
    }

    /// Remote-control command and argument carrying out the action.
    #[must_use]
    pub fn remote_command(&self) -> (&'static str, Value) {
        match self {
            Self::Play {
                video_id,
                playlist_id,
            } => {
                let mut endpoint = json!({ "videoId": video_id });
                if let (Some(playlist), Value::Object(fields)) = (playlist_id, &mut endpoint) {
                    fields.insert("playlistId".to_owned(), Value::from(playlist.as_str()));
                }
                ("navigate", json!({ "watchEndpoint": endpoint }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("ytmd://play/abc123", Some(("abc123", None)))]
    #[case("ytmd://play/abc123/PL42", Some(("abc123", Some("PL42"))))]
    #[case("ytmd://play/", None)]
    #[case("ytmd://pause/abc123", None)]
    #[case("not a url", None)]
    fn parses_play_links(#[case] url: &str, #[case] expected: Option<(&str, Option<&str>)>) {
        let parsed = ProtocolAction::parse(url);
        let expected = expected.map(|(video, playlist)| ProtocolAction::Play {
            video_id: video.to_owned(),
            playlist_id: playlist.map(str::to_owned),
        });
        assert_eq!(parsed, expected);
    }

    #[test]
    fn play_navigates_to_the_watch_endpoint() {
        let action = ProtocolAction::parse("ytmd://play/abc123/PL42").expect("valid link");
        assert_eq!(
            action.remote_command(),
            (
                "navigate",
                json!({ "watchEndpoint": { "videoId": "abc123", "playlistId": "PL42" } })
            )
        );
    }

    #[test]
    fn playlist_is_omitted_when_absent() {
        let action = ProtocolAction::parse("ytmd://play/abc123").expect("valid link");
        assert_eq!(
            action.remote_command().1,
            json!({ "watchEndpoint": { "videoId": "abc123" } })
        );
    }
}
