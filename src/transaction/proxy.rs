//! JSON routes that forward a single transaction request to upstream using
//! the caller's bearer token.
//!
//! Unlike the page routes these do not use the auth cookie, and every
//! response, including errors, is JSON of the form `{"error": "..."}`.

use axum::{
    Json,
    body::Bytes,
    extract::{FromRef, FromRequestParts, Path, State},
    http::{Method, StatusCode, header::CONTENT_TYPE, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    timezone::local_today,
    transaction::{TransactionId, UnvalidatedTransaction, validate_update},
    upstream::{UpstreamClient, UpstreamResponse},
};

const MISSING_TOKEN_MSG: &str = "Authorization token is required";
const NOT_AN_OBJECT_MSG: &str = "Request body must be a JSON object";
const INVALID_FIELDS_MSG: &str = "Request body has fields with invalid types";
const INTERNAL_ERROR_MSG: &str = "Internal server error";

/// The state needed by the proxy routes.
#[derive(Debug, Clone)]
pub struct ProxyState {
    /// The client for the upstream API.
    pub upstream: UpstreamClient,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ProxyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            upstream: state.upstream.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The token from an `Authorization: Bearer <token>` header.
///
/// Rejects the request with 401 and a JSON error if the header is missing,
/// is not a bearer token, or the token is empty.
#[derive(Debug)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await;

        match header {
            Ok(TypedHeader(Authorization(bearer))) if !bearer.token().is_empty() => {
                Ok(BearerToken(bearer.token().to_owned()))
            }
            _ => Err(json_error(StatusCode::UNAUTHORIZED, MISSING_TOKEN_MSG)),
        }
    }
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn internal_error(error: Error) -> Response {
    tracing::error!("Unexpected error while proxying a transaction request: {error}");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MSG)
}

/// Turn a relayed upstream response into the proxy's response.
///
/// `fallback_message` is used when upstream fails without a body.
fn relay_response(response: UpstreamResponse, fallback_message: &str) -> Response {
    if !response.status.is_success() {
        let body = String::from_utf8_lossy(&response.body);
        let message = if body.is_empty() {
            fallback_message
        } else {
            body.as_ref()
        };

        tracing::warn!("Upstream rejected a proxied request with {}", response.status);
        return json_error(response.status, message);
    }

    match serde_json::from_slice::<Value>(&response.body) {
        Ok(_) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "application/json")],
            response.body,
        )
            .into_response(),
        Err(error) => internal_error(Error::InvalidUpstreamResponse(error.to_string())),
    }
}

/// Fetch a single transaction.
pub async fn get_transaction_proxy(
    State(state): State<ProxyState>,
    BearerToken(token): BearerToken,
    Path(transaction_id): Path<String>,
) -> Response {
    let transaction_id = TransactionId::new(transaction_id);

    match state
        .upstream
        .forward_transaction_request(&token, Method::GET, &transaction_id, None)
        .await
    {
        Ok(response) => relay_response(response, "Failed to fetch transaction"),
        Err(error) => internal_error(error),
    }
}

/// Validate a partial update and forward the accepted fields.
///
/// Nothing is sent upstream if the body fails validation.
pub async fn update_transaction_proxy(
    State(state): State<ProxyState>,
    BearerToken(token): BearerToken,
    Path(transaction_id): Path<String>,
    body: Bytes,
) -> Response {
    let transaction_id = TransactionId::new(transaction_id);

    let fields = match serde_json::from_slice::<Value>(&body) {
        Ok(value @ Value::Object(_)) => value,
        _ => return json_error(StatusCode::BAD_REQUEST, NOT_AN_OBJECT_MSG),
    };

    let unvalidated: UnvalidatedTransaction = match serde_json::from_value(fields) {
        Ok(unvalidated) => unvalidated,
        Err(error) => {
            tracing::debug!("Could not read update for transaction {transaction_id}: {error}");
            return json_error(StatusCode::BAD_REQUEST, INVALID_FIELDS_MSG);
        }
    };

    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return internal_error(error),
    };

    let update = match validate_update(&unvalidated, today) {
        Ok(update) => update,
        Err(errors) => {
            let message = errors
                .first()
                .map(|error| error.to_string())
                .unwrap_or_default();
            return json_error(StatusCode::BAD_REQUEST, &message);
        }
    };

    match state
        .upstream
        .forward_transaction_request(&token, Method::PATCH, &transaction_id, Some(&update))
        .await
    {
        Ok(response) => relay_response(response, "Failed to update transaction"),
        Err(error) => internal_error(error),
    }
}

/// Delete a transaction, responding with 204 on success.
pub async fn delete_transaction_proxy(
    State(state): State<ProxyState>,
    BearerToken(token): BearerToken,
    Path(transaction_id): Path<String>,
) -> Response {
    let transaction_id = TransactionId::new(transaction_id);

    match state
        .upstream
        .forward_transaction_request(&token, Method::DELETE, &transaction_id, None)
        .await
    {
        Ok(response) if response.status.is_success() => StatusCode::NO_CONTENT.into_response(),
        Ok(response) => relay_response(response, "Failed to delete transaction"),
        Err(error) => internal_error(error),
    }
}
