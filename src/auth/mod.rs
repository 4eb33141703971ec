//! Log-in and log-out against upstream, and the guards that protect the app's routes.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod redirect;
mod token;

pub use cookie::{
    DEFAULT_COOKIE_DURATION, get_token_from_cookies, invalidate_auth_cookie, set_auth_cookie,
};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
pub use redirect::{build_log_in_redirect_url, normalize_redirect_url};
pub use token::AccessToken;

#[cfg(test)]
pub use cookie::COOKIE_TOKEN;
#[cfg(test)]
pub use middleware::AuthState;
