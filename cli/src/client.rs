use iodj_core::api::models::{BackendUser, GeneratedPlaylist, Playlist, PlaylistRecord, UserProfile};
use iodj_core::api::{BackendClient, SpotifyApi};
use iodj_core::auth::{self, Location};
use iodj_core::playback::{playlist_context_uri, DeviceId, RemotePlayback};
use iodj_core::{AppConfig, ServiceError, SessionToken, StorageError, TokenStore};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::store::FileStore;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("not logged in, run `iodj login` first")]
    NotLoggedIn,

    #[error("the redirect url carries no access token")]
    NoTokenInRedirect,

    #[error("invalid redirect url: {0}")]
    InvalidRedirect(#[from] url::ParseError),

    #[error("error using InsideOutDJ services: {0}")]
    Service(#[from] ServiceError),

    #[error("session storage failed: {0}")]
    Storage(#[from] StorageError),
}

/// The address the browser was sent back to after authorizing.
struct RedirectLocation {
    url: Url,
}

impl Location for RedirectLocation {
    fn fragment(&self) -> Option<String> {
        self.url.fragment().map(str::to_owned)
    }

    fn clear_fragment(&mut self) {
        self.url.set_fragment(None);
    }
}

pub struct InsideOutClient {
    config: AppConfig,
    tokens: TokenStore<FileStore>,
    backend: BackendClient,
}

impl InsideOutClient {
    pub fn new(config: AppConfig, store: FileStore) -> Result<Self, ClientError> {
        let backend = BackendClient::from_config(&config)?;
        Ok(Self {
            config,
            tokens: TokenStore::new(store),
            backend,
        })
    }

    pub fn login_url(&self) -> Result<Url, ClientError> {
        Ok(auth::authorize_url(&self.config)?)
    }

    /// Replaces any stored token with the one in `redirect`'s fragment. A
    /// redirect without a token leaves the stored one in place.
    pub fn accept_redirect(&mut self, redirect: &str) -> Result<SessionToken, ClientError> {
        let location = RedirectLocation {
            url: Url::parse(redirect)?,
        };
        let token = location
            .fragment()
            .as_deref()
            .and_then(auth::extract_access_token)
            .ok_or(ClientError::NoTokenInRedirect)?;
        self.tokens.set_token(&token)?;
        Ok(token)
    }

    pub fn logout(&mut self) -> Result<(), ClientError> {
        Ok(auth::logout(&mut self.tokens)?)
    }

    fn token(&self) -> Result<SessionToken, ClientError> {
        self.tokens.get_token().ok_or(ClientError::NotLoggedIn)
    }

    fn spotify(&self) -> Result<SpotifyApi, ClientError> {
        Ok(SpotifyApi::from_config(&self.config, self.token()?)?)
    }

    /// The vendor profile and the matching backend user, registering it if needed.
    pub async fn whoami(&self) -> Result<(UserProfile, BackendUser), ClientError> {
        let profile = self.spotify()?.current_user().await?;
        let user = self.backend.register_user_if_absent(&profile).await?;
        Ok((profile, user))
    }

    pub async fn write_diary(
        &self,
        title: &str,
        diary: &str,
    ) -> Result<GeneratedPlaylist, ClientError> {
        let token = self.token()?;
        info!(title, "submitting diary");
        Ok(self.backend.generate_playlist(diary, title, &token).await?)
    }

    pub async fn saved_playlists(&self) -> Result<Vec<PlaylistRecord>, ClientError> {
        let (_, user) = self.whoami().await?;
        Ok(self.backend.user_playlists(&user.id).await?)
    }

    pub async fn create_playlist(
        &self,
        title: &str,
        uris: &[String],
    ) -> Result<Playlist, ClientError> {
        let today = chrono::Local::now().date_naive();
        Ok(self
            .spotify()?
            .create_diary_playlist(title, today, uris)
            .await?)
    }

    pub async fn play(&self, playlist_id: &str, device: &str) -> Result<(), ClientError> {
        let device = DeviceId(device.to_owned());
        let context = playlist_context_uri(playlist_id);
        self.spotify()?.start_playback(&device, &context).await?;
        info!(context = %context, device = %device.as_str(), "playback started");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(dir: &tempfile::TempDir) -> InsideOutClient {
        InsideOutClient::new(
            AppConfig::default(),
            FileStore::new(dir.path().join("session.json")),
        )
        .unwrap()
    }

    #[test]
    fn redirect_token_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = client(&dir);

        let token = client
            .accept_redirect("http://localhost:3000/#access_token=abc&token_type=Bearer")
            .unwrap();
        assert_eq!(token.as_str(), "abc");
        assert_eq!(client.token().unwrap(), token);

        let token = client
            .accept_redirect("http://localhost:3000/#access_token=def")
            .unwrap();
        assert_eq!(token.as_str(), "def");
    }

    #[test]
    fn redirect_without_token_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = client(&dir);

        let err = client
            .accept_redirect("http://localhost:3000/#error=access_denied")
            .unwrap_err();
        assert!(matches!(err, ClientError::NoTokenInRedirect));
        assert!(matches!(client.token(), Err(ClientError::NotLoggedIn)));
    }

    #[test]
    fn rejected_redirect_keeps_the_stored_token() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = client(&dir);
        let stored = client
            .accept_redirect("http://localhost:3000/#access_token=good")
            .unwrap();

        let err = client
            .accept_redirect("http://localhost:3000/#error=access_denied")
            .unwrap_err();
        assert!(matches!(err, ClientError::NoTokenInRedirect));
        assert_eq!(client.token().unwrap(), stored);

        let err = client.accept_redirect("not a url").unwrap_err();
        assert!(matches!(err, ClientError::InvalidRedirect(_)));
        assert_eq!(client.token().unwrap(), stored);
    }

    #[test]
    fn logout_forgets_token() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = client(&dir);
        client
            .accept_redirect("http://localhost:3000/#access_token=abc")
            .unwrap();
        client.logout().unwrap();
        assert!(matches!(client.token(), Err(ClientError::NotLoggedIn)));
    }
}
