use thiserror::Error;

/// Failure of a call to the vendor API or the InsideOutDJ backend.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("service responded with {status}: {message}")]
    Api { status: u16, message: String },

    /// The bearer token was rejected, usually because it expired.
    #[error("session token was rejected")]
    Unauthorized,

    #[error("resource not found")]
    NotFound,

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("{0} is missing")]
    MissingField(&'static str),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Failure of a playback action.
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("no player session is connected")]
    NoSession,

    #[error("playback device is not ready")]
    DeviceNotReady,

    #[error("a player session is already connected")]
    SessionExists,

    #[error("player session failed to connect")]
    ConnectFailed,

    #[error("player has no active playback state")]
    NoActiveState,

    #[error("playback sdk error: {0}")]
    Sdk(String),

    #[error(transparent)]
    Remote(#[from] ServiceError),
}

impl PlaybackError {
    /// Precondition failures are no-ops for the user: they are logged, never shown.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            PlaybackError::NoSession | PlaybackError::DeviceNotReady | PlaybackError::NoActiveState
        )
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage is unavailable: {0}")]
    Unavailable(String),

    #[error("failed to write key {key}: {reason}")]
    Write { key: String, reason: String },
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("cannot {action} from the {from} page")]
pub struct FlowError {
    pub from: &'static str,
    pub action: &'static str,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} is not a valid value: {reason}")]
    Invalid { var: &'static str, reason: String },
}
