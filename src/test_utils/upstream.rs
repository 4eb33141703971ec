use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::Bytes,
    extract::{Request, State},
    http::{
        HeaderName, Method, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};

use crate::{capture::DescriptionClient, upstream::UpstreamClient};

/// A request received by a [StubServer].
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl RecordedRequest {
    #[track_caller]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    body: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// An HTTP server on an ephemeral port that records every request and
/// answers each one with the same status and JSON body.
pub(crate) struct StubServer {
    url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub async fn spawn(status: StatusCode, body: impl Into<String>) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            status,
            body: body.into(),
            requests: requests.clone(),
        };
        let app = Router::new().fallback(record_request).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Could not bind stub server");
        let address = listener
            .local_addr()
            .expect("Could not get stub server address");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Stub server failed");
        });

        Self {
            url: format!("http://{address}"),
            requests,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    #[track_caller]
    pub fn single_request(&self) -> RecordedRequest {
        let requests = self.requests();

        assert_eq!(
            requests.len(),
            1,
            "want exactly one request, got {requests:#?}"
        );

        requests[0].clone()
    }

    #[track_caller]
    pub fn assert_no_requests(&self) {
        let requests = self.requests();

        assert!(requests.is_empty(), "want no requests, got {requests:#?}");
    }
}

async fn record_request(State(state): State<StubState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let header_text = |name: HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    };
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Could not read stub request body");

    state.requests.lock().unwrap().push(RecordedRequest {
        method: parts.method.clone(),
        path: parts.uri.path().to_owned(),
        authorization: header_text(AUTHORIZATION),
        content_type: header_text(CONTENT_TYPE),
        body,
    });

    (
        state.status,
        [(CONTENT_TYPE, "application/json")],
        state.body,
    )
        .into_response()
}

fn test_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("Could not build HTTP client")
}

pub(crate) fn upstream_client(upstream: &StubServer) -> UpstreamClient {
    UpstreamClient::with_client(test_http_client(), upstream.url())
        .expect("Stub server URL should be valid")
}

pub(crate) fn describe_client(service: &StubServer) -> DescriptionClient {
    DescriptionClient::with_client(test_http_client(), &format!("{}/describe", service.url()))
        .expect("Stub server URL should be valid")
}
