//! Defines the endpoint for creating a new transaction.

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;

use crate::{
    AppState,
    auth::AccessToken,
    endpoints,
    timezone::local_today,
    transaction::form::{TransactionFormData, TransactionFormState, transaction_form_fields},
    upstream::UpstreamClient,
};

/// The state needed to create or update a transaction.
#[derive(Debug, Clone)]
pub struct TransactionEndpointState {
    /// The client for the upstream transactions API.
    pub upstream: UpstreamClient,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            upstream: state.upstream.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler for creating a new transaction, redirects to transactions view on success.
///
/// Invalid input is sent back as the form fields with inline errors and
/// nothing is sent upstream.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionEndpointState>,
    Extension(token): Extension<AccessToken>,
    Form(data): Form<TransactionFormData>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let mut form = TransactionFormState::from_form_data(&data);
    form.enter_amount(&data.amount);

    let transaction = match form.submit(today) {
        Ok(transaction) => transaction,
        Err(_) => return transaction_form_fields(&form, today).into_response(),
    };

    if let Err(error) = state.upstream.create_transaction(&token, &transaction).await {
        return error.into_upstream_alert_response("Failed to create new transaction!");
    }

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
