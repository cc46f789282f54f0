use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::emotion::{Emotion, EmotionCoordinate, Palette};
use crate::types::Artist;

// ------ vendor api ------

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewPlaylist {
    pub name: String,
    pub description: String,
    pub public: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub tracks: PlaylistTracks,
}

impl Playlist {
    pub fn uri(&self) -> String {
        format!("spotify:playlist:{}", self.id)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct PlaylistTracks {
    pub total: u32,
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PlaylistItem {
    pub track: Option<PlaylistTrack>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PlaylistTrack {
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub artists: Vec<Artist>,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct AddTracks<'a> {
    pub uris: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SnapshotId {
    pub snapshot_id: String,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct TransferPlayback<'a> {
    pub device_ids: [&'a str; 1],
    pub play: bool,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct StartPlayback<'a> {
    pub context_uri: &'a str,
}

// ------ backend ------

/// Backend ids arrive as numbers or strings depending on the table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RecordId(pub String);

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => Ok(RecordId(s)),
            serde_json::Value::Number(n) => Ok(RecordId(n.to_string())),
            other => Err(de::Error::custom(format!("unexpected id {other}"))),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BackendUser {
    pub id: RecordId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewUser {
    pub email: String,
    pub display_name: Option<String>,
    pub spotify_id: String,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct GenerationRequest<'a> {
    pub diary: &'a str,
    pub title: &'a str,
    pub token: &'a str,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub struct EmotionAnalysis {
    pub normalized_emotion: EmotionCoordinate,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GeneratedPlaylist {
    pub playlist_id: String,
    pub playlist_name: String,
    pub emotion_analysis: EmotionAnalysis,
}

impl GeneratedPlaylist {
    pub fn emotion(&self) -> Emotion {
        self.emotion_analysis.normalized_emotion.emotion()
    }

    pub fn palette(&self) -> Palette {
        self.emotion_analysis.normalized_emotion.palette()
    }
}

/// A saved diary playlist. Created by the backend and read-only here.
#[derive(Clone, Debug, Deserialize)]
pub struct PlaylistRecord {
    #[serde(rename = "id", default)]
    pub record_id: Option<RecordId>,
    #[serde(rename = "playlist_id")]
    pub id: String,
    #[serde(rename = "playlist_name")]
    pub name: String,
    #[serde(rename = "diary", default)]
    pub diary_text: String,
    pub emotion_analysis: EmotionAnalysis,
}

impl PlaylistRecord {
    pub fn coordinate(&self) -> EmotionCoordinate {
        self.emotion_analysis.normalized_emotion
    }

    pub fn emotion(&self) -> Emotion {
        self.coordinate().emotion()
    }

    pub fn palette(&self) -> Palette {
        self.coordinate().palette()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_ids_accept_numbers_and_strings() {
        let user: BackendUser = serde_json::from_str(r#"{"id": 7, "email": "a@b.c"}"#).unwrap();
        assert_eq!(user.id, RecordId("7".to_owned()));

        let user: BackendUser = serde_json::from_str(r#"{"id": "u-7"}"#).unwrap();
        assert_eq!(user.id.to_string(), "u-7");

        assert!(serde_json::from_str::<BackendUser>(r#"{"id": [1]}"#).is_err());
    }

    #[test]
    fn playlist_record_from_backend_shape() {
        let json = r#"{
            "id": 3,
            "playlist_id": "5abc",
            "playlist_name": "rainy - 2024. 8. 19",
            "diary": "it rained all day",
            "emotion_analysis": {"normalized_emotion": {"x": -0.3, "y": -0.6}}
        }"#;
        let record: PlaylistRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.record_id, Some(RecordId("3".to_owned())));
        assert_eq!(record.id, "5abc");
        assert_eq!(record.diary_text, "it rained all day");
        assert_eq!(record.emotion(), Emotion::Sadness);
        assert_eq!(record.palette(), Palette::Blue);
    }

    #[test]
    fn created_playlist_without_items() {
        let json = r#"{"id": "p1", "name": "t", "description": null,
            "tracks": {"href": "x", "total": 0}, "owner": {"id": "u"}}"#;
        let playlist: Playlist = serde_json::from_str(json).unwrap();
        assert!(playlist.tracks.items.is_empty());
        assert_eq!(playlist.uri(), "spotify:playlist:p1");
    }
}
