use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{header::AUTHORIZATION, Client, RequestBuilder};
use tracing::{debug, info};
use url::Url;

use super::models::{
    AddTracks, NewPlaylist, Playlist, SnapshotId, StartPlayback, TransferPlayback, UserProfile,
};
use super::{check, endpoint, http_client, parse, parse_base_url};
use crate::config::AppConfig;
use crate::error::ServiceResult;
use crate::playback::{DeviceId, RemotePlayback};
use crate::token::SessionToken;

pub const DIARY_PLAYLIST_DESCRIPTION: &str = "Playlist created based on diary entry";

/// Name of a playlist created for a diary entry on `date`.
pub fn diary_playlist_name(title: &str, date: NaiveDate) -> String {
    format!("{} - {}", title, date.format("%Y. %-m. %-d"))
}

/// Vendor web api client. Every request carries the session token.
#[derive(Clone)]
pub struct SpotifyApi {
    http: Client,
    base_url: Url,
    token: SessionToken,
}

impl SpotifyApi {
    pub fn new(base_url: &str, token: SessionToken) -> ServiceResult<Self> {
        Ok(Self {
            http: http_client()?,
            base_url: parse_base_url(base_url)?,
            token,
        })
    }

    pub fn from_config(config: &AppConfig, token: SessionToken) -> ServiceResult<Self> {
        Self::new(&config.api_base_url, token)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, self.token.bearer())
    }

    pub async fn current_user(&self) -> ServiceResult<UserProfile> {
        let url = endpoint(&self.base_url, &["me"])?;
        let response = self.authorized(self.http.get(url)).send().await?;
        let profile: UserProfile = parse(response, "user profile").await?;
        debug!(user = %profile.id, "fetched user profile");
        Ok(profile)
    }

    pub async fn create_playlist(
        &self,
        user_id: &str,
        playlist: &NewPlaylist,
    ) -> ServiceResult<Playlist> {
        let url = endpoint(&self.base_url, &["users", user_id, "playlists"])?;
        let response = self
            .authorized(self.http.post(url))
            .json(playlist)
            .send()
            .await?;
        let created: Playlist = parse(response, "created playlist").await?;
        info!(playlist = %created.id, name = %created.name, "created playlist");
        Ok(created)
    }

    pub async fn add_tracks(
        &self,
        playlist_id: &str,
        uris: &[String],
        position: Option<u32>,
    ) -> ServiceResult<SnapshotId> {
        let url = endpoint(&self.base_url, &["playlists", playlist_id, "tracks"])?;
        let response = self
            .authorized(self.http.post(url))
            .json(&AddTracks { uris, position })
            .send()
            .await?;
        let snapshot = parse(response, "playlist snapshot").await?;
        debug!(playlist = %playlist_id, count = uris.len(), "added tracks");
        Ok(snapshot)
    }

    pub async fn playlist(&self, playlist_id: &str) -> ServiceResult<Playlist> {
        let url = endpoint(&self.base_url, &["playlists", playlist_id])?;
        let response = self.authorized(self.http.get(url)).send().await?;
        parse(response, "playlist").await
    }

    /// Creates a private playlist for the current user named after the diary
    /// title, fills it with `uris` and returns it as stored.
    pub async fn create_diary_playlist(
        &self,
        title: &str,
        date: NaiveDate,
        uris: &[String],
    ) -> ServiceResult<Playlist> {
        let user = self.current_user().await?;
        let created = self
            .create_playlist(
                &user.id,
                &NewPlaylist {
                    name: diary_playlist_name(title, date),
                    description: DIARY_PLAYLIST_DESCRIPTION.to_owned(),
                    public: false,
                },
            )
            .await?;
        if !uris.is_empty() {
            self.add_tracks(&created.id, uris, Some(0)).await?;
        }
        self.playlist(&created.id).await
    }
}

#[async_trait(?Send)]
impl RemotePlayback for SpotifyApi {
    async fn transfer_playback(&self, device: &DeviceId, play: bool) -> ServiceResult<()> {
        let url = endpoint(&self.base_url, &["me", "player"])?;
        let response = self
            .authorized(self.http.put(url))
            .json(&TransferPlayback {
                device_ids: [device.as_str()],
                play,
            })
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn start_playback(&self, device: &DeviceId, context_uri: &str) -> ServiceResult<()> {
        let mut url = endpoint(&self.base_url, &["me", "player", "play"])?;
        url.query_pairs_mut().append_pair("device_id", device.as_str());
        let response = self
            .authorized(self.http.put(url))
            .json(&StartPlayback { context_uri })
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diary_playlist_names_carry_the_date() {
        let date = NaiveDate::from_ymd_opt(2024, 8, 19).unwrap();
        assert_eq!(diary_playlist_name("rainy", date), "rainy - 2024. 8. 19");
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(SpotifyApi::new("nope", SessionToken("t".to_owned())).is_err());
    }
}
