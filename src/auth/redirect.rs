//! Works out where to send the user after they log in.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

/// Whether `redirect_url` is a local path that is safe to redirect to after log-in.
///
/// Protocol-relative URLs ("//evil.example") and the log-in page itself are rejected.
fn is_safe_redirect_url(redirect_url: &str) -> bool {
    if !redirect_url.starts_with('/') || redirect_url.starts_with("//") {
        return false;
    }

    let path = redirect_url
        .split_once('?')
        .map_or(redirect_url, |(path, _)| path);

    path != endpoints::LOG_IN_VIEW
}

/// Reduce a user-supplied redirect URL to a safe path and query, or `None`
/// if it points anywhere other than this site.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;

    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

/// The log-in URL that sends the user back to what they were doing in `request`.
///
/// HTMX requests to `/api` routes use the page in `HX-Current-URL`, other
/// requests use their own path. Falls back to the transactions page.
pub fn build_log_in_redirect_url(request: &Request) -> String {
    let redirect_target = if request.uri().path().starts_with("/api") {
        redirect_target_from_hx_request(request)
    } else {
        request
            .uri()
            .path_and_query()
            .and_then(|path_and_query| normalize_redirect_url(path_and_query.as_str()))
    };

    let redirect_target = redirect_target.unwrap_or_else(|| {
        tracing::warn!(
            "Could not get a redirect URL for {}. Falling back to transactions page.",
            request.uri()
        );
        endpoints::TRANSACTIONS_VIEW.to_owned()
    });

    log_in_redirect_url_for(&redirect_target)
}

fn log_in_redirect_url_for(redirect_target: &str) -> String {
    match serde_urlencoded::to_string([("redirect_url", redirect_target)]) {
        Ok(query) => format!("{}?{}", endpoints::LOG_IN_VIEW, query),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {redirect_target}: {error}");
            endpoints::LOG_IN_VIEW.to_owned()
        }
    }
}

fn redirect_target_from_hx_request(request: &Request) -> Option<String> {
    let headers = request.headers();
    let is_hx_request = headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"));

    if !is_hx_request {
        tracing::warn!("Missing HX-Request header for /api request.");
        return None;
    }

    let current_url = headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())?;

    // HX-Current-URL is absolute, so only its path and query are kept.
    let redirect_url = current_url
        .parse::<Uri>()
        .ok()
        .and_then(|uri| uri.path_and_query().map(|pq| pq.as_str().to_owned()))
        .filter(|path_and_query| is_safe_redirect_url(path_and_query));

    if redirect_url.is_none() {
        tracing::warn!("Invalid HX-Current-URL header value: {current_url}");
    }

    redirect_url
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, extract::Request};

    use crate::endpoints;

    use super::{build_log_in_redirect_url, normalize_redirect_url};

    #[test]
    fn accepts_local_paths() {
        assert_eq!(
            normalize_redirect_url("/transactions/1/edit?x=1"),
            Some("/transactions/1/edit?x=1".to_owned())
        );
    }

    #[test]
    fn rejects_other_sites() {
        for url in [
            "https://evil.example/transactions",
            "//evil.example/transactions",
            "transactions",
            endpoints::LOG_IN_VIEW,
        ] {
            assert_eq!(normalize_redirect_url(url), None, "{url} should be rejected");
        }
    }

    #[test]
    fn page_request_redirects_back_to_itself() {
        let request = Request::get("/transactions/new").body(Body::empty()).unwrap();

        assert_eq!(
            build_log_in_redirect_url(&request),
            "/log_in?redirect_url=%2Ftransactions%2Fnew"
        );
    }

    #[test]
    fn api_request_redirects_to_current_page() {
        let request = Request::post("/api/transactions")
            .header("HX-Request", "true")
            .header("HX-Current-URL", "http://localhost:3000/transactions/7/edit")
            .body(Body::empty())
            .unwrap();

        assert_eq!(
            build_log_in_redirect_url(&request),
            "/log_in?redirect_url=%2Ftransactions%2F7%2Fedit"
        );
    }

    #[test]
    fn api_request_without_htmx_falls_back_to_transactions() {
        let request = Request::post("/api/transactions")
            .body(Body::empty())
            .unwrap();

        assert_eq!(
            build_log_in_redirect_url(&request),
            "/log_in?redirect_url=%2Ftransactions"
        );
    }
}
