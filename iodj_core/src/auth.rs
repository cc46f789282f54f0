//! Implicit-grant login: send the user to the vendor's authorize page, and
//! pick the token out of the URL fragment when they come back.

use tracing::{debug, info, warn};
use url::{form_urlencoded, Url};

use crate::config::AppConfig;
use crate::error::{ServiceError, StorageError};
use crate::token::{KeyValueStore, SessionToken, TokenStore};

/// The current page address, as far as the login flow needs it.
pub trait Location {
    /// The fragment without the leading `#`, if any.
    fn fragment(&self) -> Option<String>;

    /// Removes the fragment from the visible address.
    fn clear_fragment(&mut self);
}

pub fn authorize_url(config: &AppConfig) -> Result<Url, ServiceError> {
    let mut url = Url::parse(&config.auth_endpoint)
        .map_err(|e| ServiceError::InvalidUrl(format!("{}: {e}", config.auth_endpoint)))?;
    url.query_pairs_mut()
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("response_type", "token")
        .append_pair("scope", &config.scopes.join(" "));
    Ok(url)
}

/// Finds `access_token=<value>` among the `&`-separated fragment pairs.
pub fn extract_access_token(fragment: &str) -> Option<SessionToken> {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    form_urlencoded::parse(fragment.as_bytes())
        .find(|(key, _)| key == "access_token")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .map(SessionToken)
}

/// Runs once on page load. A stored token wins; otherwise the fragment is
/// consulted, and a token found there is persisted and the fragment cleared.
/// Calling it again with nothing new is a no-op.
pub fn complete_login<S: KeyValueStore>(
    store: &mut TokenStore<S>,
    location: &mut impl Location,
) -> Option<SessionToken> {
    if let Some(token) = store.get_token() {
        debug!("using persisted session token");
        return Some(token);
    }

    let fragment = location.fragment()?;
    let Some(token) = extract_access_token(&fragment) else {
        debug!("redirect fragment carries no access token");
        return None;
    };

    if let Err(err) = store.set_token(&token) {
        warn!(error = %err, "could not persist session token, it will not survive a reload");
    }
    location.clear_fragment();
    info!("logged in through authorization redirect");
    Some(token)
}

pub fn logout<S: KeyValueStore>(store: &mut TokenStore<S>) -> Result<(), StorageError> {
    info!("logging out");
    store.clear_token()
}
