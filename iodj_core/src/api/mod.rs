//! HTTP clients for the vendor web api and the InsideOutDJ backend.
//!
//! Calls are made once and never retried; callers decide how to surface a
//! failure.

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::warn;
use url::Url;

use crate::error::{ServiceError, ServiceResult};

pub mod backend;
pub mod models;
pub mod spotify;

pub use backend::BackendClient;
pub use spotify::SpotifyApi;

#[cfg(not(target_arch = "wasm32"))]
fn http_client() -> ServiceResult<Client> {
    use std::time::Duration;

    Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(format!("InsideOutDJ/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ServiceError::Request)
}

// the browser's fetch decides timeouts and the user agent
#[cfg(target_arch = "wasm32")]
fn http_client() -> ServiceResult<Client> {
    Ok(Client::new())
}

fn parse_base_url(base_url: &str) -> ServiceResult<Url> {
    let url = Url::parse(base_url.trim_end_matches('/'))
        .map_err(|e| ServiceError::InvalidUrl(format!("{base_url}: {e}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ServiceError::InvalidUrl(format!(
            "{base_url}: must be an http or https url"
        )));
    }
    Ok(url)
}

/// Appends percent-encoded path segments to `base`.
fn endpoint(base: &Url, segments: &[&str]) -> ServiceResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ServiceError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turns non-success statuses into errors.
async fn check(response: Response) -> ServiceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    warn!(status = %status, error = %message, "request rejected");
    Err(match status {
        StatusCode::UNAUTHORIZED => ServiceError::Unauthorized,
        StatusCode::NOT_FOUND => ServiceError::NotFound,
        _ => ServiceError::Api {
            status: status.as_u16(),
            message,
        },
    })
}

async fn parse<T: DeserializeOwned>(response: Response, what: &str) -> ServiceResult<T> {
    let response = check(response).await?;
    response
        .json()
        .await
        .map_err(|e| ServiceError::Parse(format!("{what}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_encoded_and_joined() {
        let base = parse_base_url("http://localhost:8000/").unwrap();
        let url = endpoint(&base, &["users", "check_by_email", "a b@example.com"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/users/check_by_email/a%20b@example.com"
        );

        let url = endpoint(&base, &["users", ""]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/users/");

        let base = parse_base_url("https://api.spotify.com/v1").unwrap();
        let url = endpoint(&base, &["me", "player"]).unwrap();
        assert_eq!(url.as_str(), "https://api.spotify.com/v1/me/player");
    }

    #[test]
    fn base_urls_are_validated() {
        assert!(parse_base_url("").is_err());
        assert!(parse_base_url("ftp://example.com").is_err());
        assert!(parse_base_url("mailto:someone@example.com").is_err());
        assert!(parse_base_url("https://example.com").is_ok());
    }
}
