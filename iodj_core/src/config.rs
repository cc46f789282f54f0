use std::{env, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_CLIENT_ID: &str = "072d48a69d3247b0a03ac8c3734997b2";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/";
pub const DEFAULT_AUTH_ENDPOINT: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_PLAYER_NAME: &str = "InsideOutDJ Webplayer";

/// Minimum time the loading page stays up while a playlist is generated.
pub const DEFAULT_LOADING_FLOOR: Duration = Duration::from_secs(3);

pub fn scopes() -> Vec<String> {
    [
        "playlist-modify-public",
        "playlist-modify-private",
        "user-modify-playback-state",
        "user-read-playback-state",
        "user-read-currently-playing",
        "streaming",
        "user-read-email",
        "user-read-private",
    ]
    .map(|s| s.to_owned())
    .to_vec()
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    pub client_id: String,
    pub redirect_uri: String,
    pub auth_endpoint: String,
    pub api_base_url: String,
    pub backend_url: String,
    pub scopes: Vec<String>,
    pub player_name: String,
    pub initial_volume: f32,
    pub loading_floor: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_owned(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_owned(),
            auth_endpoint: DEFAULT_AUTH_ENDPOINT.to_owned(),
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            backend_url: DEFAULT_BACKEND_URL.to_owned(),
            scopes: scopes(),
            player_name: DEFAULT_PLAYER_NAME.to_owned(),
            initial_volume: 0.5,
            loading_floor: DEFAULT_LOADING_FLOOR,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by any `IODJ_*` variables present in the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = lookup("IODJ_CLIENT_ID") {
            config.client_id = v;
        }
        if let Some(v) = lookup("IODJ_REDIRECT_URI") {
            config.redirect_uri = v;
        }
        if let Some(v) = lookup("IODJ_AUTH_ENDPOINT") {
            config.auth_endpoint = v;
        }
        if let Some(v) = lookup("IODJ_API_BASE_URL") {
            config.api_base_url = v;
        }
        if let Some(v) = lookup("IODJ_BACKEND_URL") {
            config.backend_url = v;
        }
        if let Some(v) = lookup("IODJ_PLAYER_NAME") {
            config.player_name = v;
        }
        if let Some(v) = lookup("IODJ_INITIAL_VOLUME") {
            let volume: f32 = v.parse().map_err(|_| ConfigError::Invalid {
                var: "IODJ_INITIAL_VOLUME",
                reason: format!("{v:?} is not a number"),
            })?;
            if !(0.0..=1.0).contains(&volume) {
                return Err(ConfigError::Invalid {
                    var: "IODJ_INITIAL_VOLUME",
                    reason: format!("{volume} is outside 0..1"),
                });
            }
            config.initial_volume = volume;
        }
        if let Some(v) = lookup("IODJ_LOADING_FLOOR_MS") {
            let millis: u64 = v.parse().map_err(|_| ConfigError::Invalid {
                var: "IODJ_LOADING_FLOOR_MS",
                reason: format!("{v:?} is not a whole number of milliseconds"),
            })?;
            config.loading_floor = Duration::from_millis(millis);
        }

        Ok(config)
    }
}
