//! Stores the access token in an encrypted cookie.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::auth::AccessToken;

/// The name of the cookie holding the access token.
pub const COOKIE_TOKEN: &str = "accessToken";

/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::days(7);

/// Add the auth cookie to `jar`, marking the user as logged in.
///
/// The cookie expires `duration` from now.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    token: &AccessToken,
    duration: Duration,
) -> PrivateCookieJar {
    let expiry = OffsetDateTime::now_utc() + duration;

    jar.add(
        Cookie::build((COOKIE_TOKEN, token.as_str().to_owned()))
            .path("/")
            .expires(expiry)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Set the auth cookie to an invalid value and set its max age to zero, which
/// should delete the cookie on the client side.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Get the access token from the auth cookie, if there is one.
///
/// Cookies that fail to decrypt are dropped by [PrivateCookieJar], so a
/// tampered cookie reads as missing.
pub fn get_token_from_cookies(jar: &PrivateCookieJar) -> Option<AccessToken> {
    jar.get(COOKIE_TOKEN)
        .map(|cookie| cookie.value_trimmed().to_owned())
        .filter(|token| !token.is_empty() && token != "deleted")
        .map(AccessToken::new)
}
