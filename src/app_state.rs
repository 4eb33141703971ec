//! Implements a struct that holds the state of the server.

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error, capture::DescriptionClient, timezone::get_local_offset, upstream::UpstreamClient,
};

/// The state of the server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The client for the upstream transactions API.
    pub upstream: UpstreamClient,

    /// The client for the image description service.
    pub describer: DescriptionClient,
}

impl AppState {
    /// Create a new [AppState].
    ///
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidTimezoneError] if `local_timezone` is not a known timezone.
    pub fn new(
        cookie_secret: &str,
        cookie_duration: Duration,
        local_timezone: &str,
        upstream: UpstreamClient,
        describer: DescriptionClient,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration,
            local_timezone: local_timezone.to_owned(),
            upstream,
            describer,
        })
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

impl FromRef<AppState> for UpstreamClient {
    fn from_ref(state: &AppState) -> Self {
        state.upstream.clone()
    }
}

/// Create a signing key for cookies from a `secret`s string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use crate::{
        Error,
        capture::DescriptionClient,
        upstream::UpstreamClient,
    };

    use super::AppState;

    #[test]
    fn rejects_unknown_timezone() {
        let got = AppState::new(
            "secret",
            Duration::days(7),
            "Middle/Earth",
            UpstreamClient::new("http://localhost:8080").unwrap(),
            DescriptionClient::new("http://localhost:8081/describe").unwrap(),
        );

        assert!(matches!(got, Err(Error::InvalidTimezoneError(_))));
    }
}
