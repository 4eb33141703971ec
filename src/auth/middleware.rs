//! Authentication middleware that reads the access token cookie and handles redirects.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;

use crate::{
    AppState,
    auth::{build_log_in_redirect_url, get_token_from_cookies},
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

#[inline]
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    get_redirect: impl Fn(String) -> Response,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Error getting cookie jar: {error:?}. Redirecting to log in page.");
            let request = Request::from_parts(parts, body);
            return get_redirect(build_log_in_redirect_url(&request));
        }
    };

    let Some(token) = get_token_from_cookies(&jar) else {
        let request = Request::from_parts(parts, body);
        return get_redirect(build_log_in_redirect_url(&request));
    };

    parts.extensions.insert(token);
    next.run(Request::from_parts(parts, body)).await
}

/// Middleware function that checks for the access token cookie.
///
/// The token is placed into the request and the request executed normally if
/// the cookie is present, otherwise the client is redirected to the log-in page.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(token): Extension<AccessToken>` to receive the token.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, |redirect_url| {
        Redirect::to(&redirect_url).into_response()
    })
    .await
}

/// Middleware function that checks for the access token cookie.
///
/// Same as [auth_guard], except the redirect to the log-in page is sent as an
/// `HX-Redirect` header so that it works for requests made by HTMX.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, |redirect_url| {
        (HxRedirect(redirect_url), StatusCode::OK).into_response()
    })
    .await
}
