//! A typed client for the upstream API, the service of record for transactions.
//!
//! Every call except log-in is authenticated with the user's bearer token.

use axum::{
    body::Bytes,
    http::{Method, StatusCode},
};
use reqwest::{Response, Url};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::AccessToken,
    transaction::{NewTransaction, Transaction, TransactionId, TransactionUpdate},
};

/// The upstream path for listing transactions.
const TRANSACTIONS_PATH: &str = "transactions";
/// The upstream path for creating a transaction.
const INSERT_TRANSACTION_PATH: [&str; 2] = ["accounts", "insert"];
/// The upstream path for logging in.
const LOG_IN_PATH: [&str; 2] = ["auth", "login"];

/// Client for the upstream transactions API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: Url,
}

/// A response from upstream that is relayed as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    /// The status code from upstream.
    pub status: StatusCode,
    /// The raw response body.
    pub body: Bytes,
}

#[derive(Serialize)]
struct LogInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LogInResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
}

impl UpstreamClient {
    /// Create a client for the API at `base_url`, e.g. "https://api.example.com/v1".
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidUrl] if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, Error> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client that sends requests with `http`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidUrl] if `base_url` is not an absolute URL.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, Error> {
        let parsed_url =
            Url::parse(base_url).map_err(|error| Error::InvalidUrl(format!("{base_url}: {error}")))?;

        if parsed_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(format!(
                "{base_url}: cannot be used as a base URL"
            )));
        }

        Ok(Self {
            http,
            base_url: parsed_url,
        })
    }

    /// Build the URL for `segments` under the base URL.
    ///
    /// Each segment is percent-encoded, so an ID cannot change the path structure.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();

        // `cannot_be_a_base` URLs are rejected when the client is created.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }

        url
    }

    /// Get all of the user's transactions.
    ///
    /// # Errors
    ///
    /// Returns an error if upstream cannot be reached, rejects the token, or
    /// responds with something other than a list of transactions.
    pub async fn list_transactions(&self, token: &AccessToken) -> Result<Vec<Transaction>, Error> {
        let response = self
            .http
            .get(self.url(&[TRANSACTIONS_PATH]))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        parse_json(check_status(response).await?).await
    }

    /// Get a single transaction.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if upstream has no transaction with `id`, and
    /// other errors as for [UpstreamClient::list_transactions].
    pub async fn get_transaction(
        &self,
        token: &AccessToken,
        id: &TransactionId,
    ) -> Result<Transaction, Error> {
        let response = self
            .http
            .get(self.url(&[TRANSACTIONS_PATH, id.as_str()]))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        parse_json(check_status(response).await?).await
    }

    /// Create a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if upstream cannot be reached or responds with a
    /// non-success status code.
    pub async fn create_transaction(
        &self,
        token: &AccessToken,
        transaction: &NewTransaction,
    ) -> Result<(), Error> {
        let response = self
            .http
            .post(self.url(&INSERT_TRANSACTION_PATH))
            .bearer_auth(token.as_str())
            .json(transaction)
            .send()
            .await?;

        check_status(response).await.map(|_| ())
    }

    /// Update the fields of a transaction that are set in `update`.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if upstream has no transaction with `id`, or
    /// another error if upstream cannot be reached or rejects the update.
    pub async fn update_transaction(
        &self,
        token: &AccessToken,
        id: &TransactionId,
        update: &TransactionUpdate,
    ) -> Result<(), Error> {
        let response = self
            .http
            .patch(self.url(&[TRANSACTIONS_PATH, id.as_str()]))
            .bearer_auth(token.as_str())
            .json(update)
            .send()
            .await?;

        check_status(response).await.map(|_| ())
    }

    /// Exchange an email and password for an access token.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidCredentials] if upstream rejects the credentials.
    pub async fn log_in(&self, email: &str, password: &str) -> Result<AccessToken, Error> {
        let response = self
            .http
            .post(self.url(&LOG_IN_PATH))
            .json(&LogInRequest { email, password })
            .send()
            .await?;

        let response = match check_status(response).await {
            Ok(response) => response,
            Err(Error::Unauthorized) => return Err(Error::InvalidCredentials),
            Err(Error::UpstreamStatus { status, .. }) if status == StatusCode::FORBIDDEN => {
                return Err(Error::InvalidCredentials);
            }
            Err(error) => return Err(error),
        };

        let body: LogInResponse = parse_json(response).await?;

        Ok(AccessToken::new(body.access_token))
    }

    /// Send `method` to the upstream URL of the transaction `id` and return
    /// the response without interpreting its status.
    ///
    /// # Errors
    ///
    /// Returns [Error::UpstreamRequest] if upstream cannot be reached or the
    /// response body cannot be read.
    pub async fn forward_transaction_request(
        &self,
        token: &str,
        method: Method,
        id: &TransactionId,
        body: Option<&TransactionUpdate>,
    ) -> Result<UpstreamResponse, Error> {
        let mut request = self
            .http
            .request(method, self.url(&[TRANSACTIONS_PATH, id.as_str()]))
            .bearer_auth(token);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        Ok(UpstreamResponse { status, body })
    }
}

/// Map non-success status codes to errors.
async fn check_status(response: Response) -> Result<Response, Error> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED => Err(Error::Unauthorized),
        StatusCode::NOT_FOUND => Err(Error::NotFound),
        status => {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Upstream responded with {status}: {body}");
            Err(Error::UpstreamStatus { status, body })
        }
    }
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, Error> {
    response.json().await.map_err(|error| {
        tracing::error!("Could not parse upstream response: {error}");
        Error::InvalidUpstreamResponse(error.to_string())
    })
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use time::macros::date;

    use crate::{
        Error,
        auth::AccessToken,
        test_utils::{StubServer, upstream_client},
        transaction::{NewTransaction, TransactionId, TransactionType, TransactionUpdate},
    };

    use super::UpstreamClient;

    #[test]
    fn rejects_relative_base_url() {
        assert!(matches!(
            UpstreamClient::new("api/v1"),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn builds_urls_under_base_path() {
        let client = UpstreamClient::new("http://localhost:8080/api/").unwrap();

        assert_eq!(
            client.url(&["transactions", "42"]).as_str(),
            "http://localhost:8080/api/transactions/42"
        );
    }

    #[test]
    fn ids_cannot_escape_the_transactions_path() {
        let client = UpstreamClient::new("http://localhost:8080").unwrap();

        assert_eq!(
            client.url(&["transactions", "../accounts"]).as_str(),
            "http://localhost:8080/transactions/..%2Faccounts"
        );
    }

    #[tokio::test]
    async fn create_sends_bearer_token_and_json() {
        let upstream = StubServer::spawn(StatusCode::CREATED, r#"{"id": 1}"#).await;
        let client = upstream_client(&upstream);
        let transaction = NewTransaction {
            amount: 500,
            transaction_type: TransactionType::Expense,
            category_id: 1,
            description: "Coffee".to_owned(),
            date: date!(2025 - 01 - 02),
        };

        client
            .create_transaction(&AccessToken::new("secret"), &transaction)
            .await
            .unwrap();

        let request = upstream.single_request();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/accounts/insert");
        assert_eq!(request.authorization.as_deref(), Some("Bearer secret"));
        assert_eq!(
            request.json(),
            serde_json::json!({
                "amount": 500,
                "type": "EXPENSE",
                "categoryID": 1,
                "description": "Coffee",
                "date": "2025-01-02",
            })
        );
    }

    #[tokio::test]
    async fn maps_status_codes_to_errors() {
        let cases = [
            (StatusCode::UNAUTHORIZED, Error::Unauthorized),
            (StatusCode::NOT_FOUND, Error::NotFound),
            (
                StatusCode::BAD_REQUEST,
                Error::UpstreamStatus {
                    status: StatusCode::BAD_REQUEST,
                    body: "bad".to_owned(),
                },
            ),
        ];

        for (status, want) in cases {
            let upstream = StubServer::spawn(status, "bad").await;
            let client = upstream_client(&upstream);

            let got = client
                .update_transaction(
                    &AccessToken::new("secret"),
                    &TransactionId::new("1"),
                    &TransactionUpdate::default(),
                )
                .await;

            assert_eq!(got, Err(want), "upstream status {status}");
        }
    }

    #[tokio::test]
    async fn log_in_returns_access_token() {
        let upstream = StubServer::spawn(StatusCode::OK, r#"{"accessToken": "abc"}"#).await;
        let client = upstream_client(&upstream);

        let token = client.log_in("me@example.com", "hunter2").await.unwrap();

        assert_eq!(token.as_str(), "abc");
        let request = upstream.single_request();
        assert_eq!(request.path, "/auth/login");
        assert_eq!(request.authorization, None);
    }

    #[tokio::test]
    async fn log_in_with_wrong_password_is_invalid_credentials() {
        let upstream = StubServer::spawn(StatusCode::UNAUTHORIZED, "").await;
        let client = upstream_client(&upstream);

        let got = client.log_in("me@example.com", "wrong").await;

        assert_eq!(got, Err(Error::InvalidCredentials));
    }

    #[tokio::test]
    async fn invalid_json_is_an_invalid_response() {
        let upstream = StubServer::spawn(StatusCode::OK, "<html>").await;
        let client = upstream_client(&upstream);

        let got = client.list_transactions(&AccessToken::new("secret")).await;

        assert!(matches!(got, Err(Error::InvalidUpstreamResponse(_))));
    }
}
