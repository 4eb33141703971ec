//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{
        HeaderMap, HeaderValue,
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

/// The number of bytes of a body logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
///
/// Credentials are never logged: the `Authorization`, `Cookie` and
/// `Set-Cookie` headers and the `password` form field are redacted, and
/// multipart bodies (uploaded images) are elided.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return axum::http::StatusCode::BAD_REQUEST.into_response();
        }
    };

    let body_text = body_display_text(&parts.headers, &body_bytes);
    tracing::info!(
        "Received request: {} {} {:#?}",
        parts.method,
        parts.uri,
        redact_headers(&parts.headers)
    );
    log_body("request", &body_text);

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    tracing::info!(
        "Sending response: {} {:#?}",
        parts.status,
        redact_headers(&parts.headers)
    );
    log_body("response", &body_display_text(&parts.headers, &body_bytes));

    Response::from_parts(parts, Body::from(body_bytes))
}

fn content_type_starts_with(headers: &HeaderMap, prefix: &str) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with(prefix))
}

fn body_display_text(headers: &HeaderMap, body: &Bytes) -> String {
    if content_type_starts_with(headers, "multipart/form-data") {
        return format!("<multipart body, {} bytes>", body.len());
    }

    let text = String::from_utf8_lossy(body);

    if content_type_starts_with(headers, "application/x-www-form-urlencoded") {
        redact_form_field(&text, "password")
    } else {
        text.into_owned()
    }
}

fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    for name in [AUTHORIZATION, COOKIE, SET_COOKIE] {
        if headers.contains_key(&name) {
            headers.insert(name, HeaderValue::from_static(REDACTED));
        }
    }

    headers
}

fn redact_form_field(form_text: &str, field_name: &str) -> String {
    let prefix = format!("{field_name}=");

    form_text
        .split('&')
        .map(|pair| {
            if pair.starts_with(&prefix) {
                format!("{prefix}{REDACTED}")
            } else {
                pair.to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Cut `text` to at most `limit` bytes without splitting a character.
fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }

    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}

fn log_body(kind: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "{kind} body: {:}...",
            truncate(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full {kind} body: {body:?}");
    } else {
        tracing::info!("{kind} body: {body:?}");
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Bytes,
        http::{
            HeaderMap, HeaderValue, StatusCode,
            header::{AUTHORIZATION, CONTENT_TYPE, HOST},
        },
        middleware,
        routing::post,
    };
    use axum_test::TestServer;

    use super::{
        body_display_text, logging_middleware, redact_form_field, redact_headers, truncate,
    };

    #[test]
    fn redacts_password_field() {
        let form = "email=test%40example.com&password=hunter2&redirect_url=%2F";

        assert_eq!(
            redact_form_field(form, "password"),
            "email=test%40example.com&password=********&redirect_url=%2F"
        );
    }

    #[test]
    fn leaves_form_without_password_unchanged() {
        let form = "amount=12.30&date=2024-01-02";

        assert_eq!(redact_form_field(form, "password"), form);
    }

    #[test]
    fn redacts_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        headers.insert(HOST, HeaderValue::from_static("localhost"));

        let redacted = redact_headers(&headers);

        assert_eq!(redacted.get(AUTHORIZATION).unwrap(), "********");
        assert_eq!(redacted.get(HOST).unwrap(), "localhost");
    }

    #[test]
    fn elides_multipart_bodies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data; boundary=abc"),
        );
        let body = Bytes::from_static(&[0xff, 0xd8, 0xff, 0xe0]);

        assert_eq!(
            body_display_text(&headers, &body),
            "<multipart body, 4 bytes>"
        );
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[tokio::test]
    async fn passes_binary_bodies_through_unchanged() {
        let app = Router::new()
            .route("/echo", post(|body: Bytes| async move { body }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server");
        let body = Bytes::from_static(&[0x00, 0xff, 0xfe, 0x41]);

        let response = server
            .post("/echo")
            .content_type("application/octet-stream")
            .bytes(body.clone())
            .await;

        response.assert_status(StatusCode::OK);
        assert_eq!(response.as_bytes(), &body);
    }
}
