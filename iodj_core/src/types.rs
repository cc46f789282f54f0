use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Track {
    pub name: String,
    pub artists: Vec<Artist>,
    pub cover_urls: Vec<String>,
}

impl Track {
    /// Artist names joined the way the player card shows them.
    pub fn artist_line(&self) -> String {
        self.artists
            .iter()
            .map(|artist| artist.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn cover_url(&self) -> Option<&str> {
        self.cover_urls.first().map(String::as_str)
    }
}

/// What the player view renders. Only the state-change handler and the
/// local interpolator write to it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlayerState {
    pub is_playing: bool,
    pub position: Duration,
    pub duration: Duration,
    pub current_track: Option<Track>,
}

/// Sdk payloads, as delivered by `player_state_changed`.
pub mod sdk {
    use serde::Deserialize;

    #[derive(Clone, Debug, Deserialize)]
    pub struct PlaybackSnapshot {
        pub paused: bool,
        /// milliseconds
        pub position: u64,
        /// milliseconds
        pub duration: u64,
        pub track_window: TrackWindow,
    }

    #[derive(Clone, Debug, Deserialize)]
    pub struct TrackWindow {
        pub current_track: Option<SdkTrack>,
    }

    #[derive(Clone, Debug, Deserialize)]
    pub struct SdkTrack {
        pub name: String,
        #[serde(default)]
        pub uri: Option<String>,
        #[serde(default)]
        pub artists: Vec<SdkArtist>,
        pub album: SdkAlbum,
    }

    #[derive(Clone, Debug, Deserialize)]
    pub struct SdkArtist {
        pub name: String,
    }

    #[derive(Clone, Debug, Deserialize)]
    pub struct SdkAlbum {
        #[serde(default)]
        pub name: Option<String>,
        #[serde(default)]
        pub images: Vec<SdkImage>,
    }

    #[derive(Clone, Debug, Deserialize)]
    pub struct SdkImage {
        pub url: String,
    }

    /// Payload of the `ready` and `not_ready` events.
    #[derive(Clone, Debug, Deserialize)]
    pub struct DevicePayload {
        pub device_id: String,
    }
}

pub mod conversions {
    use std::time::Duration;

    use super::sdk::{PlaybackSnapshot, SdkArtist, SdkTrack};
    use super::{Artist, PlayerState, Track};

    impl From<&SdkTrack> for Track {
        fn from(sdk_track: &SdkTrack) -> Self {
            Self {
                name: sdk_track.name.clone(),
                artists: sdk_track.artists.iter().map(|a| a.into()).collect(),
                cover_urls: sdk_track
                    .album
                    .images
                    .iter()
                    .map(|image| image.url.clone())
                    .collect(),
            }
        }
    }

    impl From<&SdkArtist> for Artist {
        fn from(sdk_artist: &SdkArtist) -> Self {
            Self {
                name: sdk_artist.name.clone(),
            }
        }
    }

    impl From<&PlaybackSnapshot> for PlayerState {
        fn from(snapshot: &PlaybackSnapshot) -> Self {
            let duration = Duration::from_millis(snapshot.duration);
            Self {
                is_playing: !snapshot.paused,
                position: Duration::from_millis(snapshot.position).min(duration),
                duration,
                current_track: snapshot.track_window.current_track.as_ref().map(Track::from),
            }
        }
    }
}

/// Formats whole seconds as `m:ss`.
pub fn format_time(time: Duration) -> String {
    let secs = time.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::sdk::PlaybackSnapshot;
    use super::*;

    const SNAPSHOT: &str = r#"{
        "paused": false,
        "position": 61500,
        "duration": 200000,
        "track_window": {
            "current_track": {
                "name": "Spring Day",
                "uri": "spotify:track:abc",
                "artists": [{"name": "BTS"}, {"name": "Guest"}],
                "album": {"name": "You Never Walk Alone", "images": [{"url": "http://img/1"}, {"url": "http://img/2"}]}
            },
            "previous_tracks": [],
            "next_tracks": []
        }
    }"#;

    #[test]
    fn snapshot_converts_to_player_state() {
        let snapshot: PlaybackSnapshot = serde_json::from_str(SNAPSHOT).unwrap();
        let state = PlayerState::from(&snapshot);

        assert!(state.is_playing);
        assert_eq!(state.position, Duration::from_millis(61500));
        assert_eq!(state.duration, Duration::from_secs(200));

        let track = state.current_track.unwrap();
        assert_eq!(track.name, "Spring Day");
        assert_eq!(track.artist_line(), "BTS, Guest");
        assert_eq!(track.cover_url(), Some("http://img/1"));
        assert_eq!(track.cover_urls.len(), 2);
    }

    #[test]
    fn snapshot_position_is_clamped_to_duration() {
        let json = r#"{"paused": true, "position": 9000, "duration": 5000,
            "track_window": {"current_track": null}}"#;
        let snapshot: PlaybackSnapshot = serde_json::from_str(json).unwrap();
        let state = PlayerState::from(&snapshot);

        assert!(!state.is_playing);
        assert_eq!(state.position, Duration::from_secs(5));
        assert!(state.current_track.is_none());
    }

    #[test]
    fn formats_minutes_and_padded_seconds() {
        assert_eq!(format_time(Duration::from_secs(0)), "0:00");
        assert_eq!(format_time(Duration::from_secs(9)), "0:09");
        assert_eq!(format_time(Duration::from_millis(125_900)), "2:05");
        assert_eq!(format_time(Duration::from_secs(3600)), "60:00");
    }
}
