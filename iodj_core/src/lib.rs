//! InsideOutDJ core: everything behind the diary player that is not a page.
//!
//! - [`auth`] / [`token`]: implicit-grant login and the persisted session token
//! - [`playback`]: the playback bridge and the [`playback::PlaybackSession`] seam
//! - [`clock`]: player state with local position interpolation
//! - [`api`]: vendor web api and backend clients
//! - [`emotion`]: emotion coordinate to label and color
//! - [`flow`]: page navigation

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod emotion;
pub mod error;
pub mod flow;
pub mod playback;
pub mod token;
pub mod types;

pub use config::AppConfig;
pub use error::{PlaybackError, ServiceError, ServiceResult, StorageError};
pub use token::{SessionToken, TokenStore};
