use axum::{http::header::SET_COOKIE, response::IntoResponse};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, Key},
};
use time::Duration;

use crate::auth::{AccessToken, set_auth_cookie};

/// The encrypted auth cookie a browser would hold after logging in with `token`.
pub(crate) fn auth_cookie(key: &Key, token: &str) -> Cookie<'static> {
    let jar = set_auth_cookie(
        PrivateCookieJar::new(key.clone()),
        &AccessToken::new(token),
        Duration::days(1),
    );
    let response = jar.into_response();
    let header = response
        .headers()
        .get(SET_COOKIE)
        .expect("missing set-cookie header")
        .to_str()
        .expect("set-cookie header should be text")
        .to_owned();

    Cookie::parse(header).expect("Could not parse auth cookie")
}
