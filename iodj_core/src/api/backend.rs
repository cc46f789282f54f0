use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use super::models::{
    BackendUser, GeneratedPlaylist, GenerationRequest, NewUser, PlaylistRecord, RecordId,
    UserProfile,
};
use super::{endpoint, http_client, parse, parse_base_url};
use crate::config::AppConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::token::SessionToken;

/// Diary text is sent as a single line.
pub fn clean_diary(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Client for the InsideOutDJ backend. Its endpoints take no authorization
/// header; playlist generation receives the vendor token in the body.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(base_url: &str) -> ServiceResult<Self> {
        Ok(Self {
            http: http_client()?,
            base_url: parse_base_url(base_url)?,
        })
    }

    pub fn from_config(config: &AppConfig) -> ServiceResult<Self> {
        Self::new(&config.backend_url)
    }

    /// `None` when no user is registered under `email`.
    pub async fn check_user_by_email(&self, email: &str) -> ServiceResult<Option<BackendUser>> {
        let url = endpoint(&self.base_url, &["users", "check_by_email", email])?;
        let response = self.http.get(url).send().await?;
        match parse(response, "user").await {
            Ok(user) => Ok(Some(user)),
            Err(ServiceError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn create_user(&self, user: &NewUser) -> ServiceResult<BackendUser> {
        let url = endpoint(&self.base_url, &["users", ""])?;
        let response = self.http.post(url).json(user).send().await?;
        let created: BackendUser = parse(response, "created user").await?;
        info!(user = %created.id, "registered user");
        Ok(created)
    }

    /// Looks the vendor user up by email and registers them when unknown.
    pub async fn register_user_if_absent(
        &self,
        profile: &UserProfile,
    ) -> ServiceResult<BackendUser> {
        let email = profile
            .email
            .as_deref()
            .ok_or(ServiceError::MissingField("profile email"))?;

        if let Some(user) = self.check_user_by_email(email).await? {
            debug!(user = %user.id, "user already registered");
            return Ok(user);
        }

        self.create_user(&NewUser {
            email: email.to_owned(),
            display_name: profile.display_name.clone(),
            spotify_id: profile.id.clone(),
        })
        .await
    }

    /// Asks the backend to analyse `diary` and build a playlist for it.
    pub async fn generate_playlist(
        &self,
        diary: &str,
        title: &str,
        token: &SessionToken,
    ) -> ServiceResult<GeneratedPlaylist> {
        let url = endpoint(&self.base_url, &["generate_playlist"])?;
        let diary = clean_diary(diary);
        let response = self
            .http
            .post(url)
            .json(&GenerationRequest {
                diary: &diary,
                title,
                token: token.as_str(),
            })
            .send()
            .await?;
        let generated: GeneratedPlaylist = parse(response, "generated playlist").await?;
        info!(
            playlist = %generated.playlist_id,
            emotion = %generated.emotion(),
            "playlist generated"
        );
        Ok(generated)
    }

    pub async fn user_playlists(&self, user_id: &RecordId) -> ServiceResult<Vec<PlaylistRecord>> {
        let url = endpoint(&self.base_url, &["users", &user_id.0, "playlists", ""])?;
        let response = self.http.get(url).send().await?;
        let playlists: Vec<PlaylistRecord> = parse(response, "saved playlists").await?;
        debug!(user = %user_id, count = playlists.len(), "fetched saved playlists");
        Ok(playlists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diary_newlines_become_spaces() {
        assert_eq!(clean_diary("first\nsecond\r\nthird"), "first second third");
        assert_eq!(clean_diary("one line"), "one line");
    }
}
