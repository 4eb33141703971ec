//! Defines the endpoint for saving changes to a transaction.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;

use crate::{
    auth::AccessToken,
    endpoints,
    timezone::local_today,
    transaction::{
        TransactionId, TransactionUpdate,
        create_endpoint::TransactionEndpointState,
        form::{TransactionFormData, TransactionFormState, transaction_form_fields},
    },
};

/// A route handler for updating a transaction, redirects to transactions view on success.
///
/// The form is validated with the same rules as creating a transaction and
/// every field is sent upstream.
pub async fn edit_transaction_endpoint(
    State(state): State<TransactionEndpointState>,
    Extension(token): Extension<AccessToken>,
    Path(transaction_id): Path<String>,
    Form(data): Form<TransactionFormData>,
) -> Response {
    let transaction_id = TransactionId::new(transaction_id);
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let mut form = TransactionFormState::from_form_data(&data);
    form.enter_amount(&data.amount);

    let update = match form.submit(today) {
        Ok(transaction) => TransactionUpdate::from(transaction),
        Err(_) => return transaction_form_fields(&form, today).into_response(),
    };

    if let Err(error) = state
        .upstream
        .update_transaction(&token, &transaction_id, &update)
        .await
    {
        tracing::error!("Could not update transaction {transaction_id}");
        return error.into_upstream_alert_response("Failed to update transaction!");
    }

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension,
        extract::{Path, State},
        http::{Method, StatusCode},
    };
    use axum_extra::extract::Form;

    use crate::{
        auth::AccessToken,
        endpoints,
        test_utils::{StubServer, assert_hx_redirect, parse_html_fragment, upstream_client},
        transaction::{create_endpoint::TransactionEndpointState, form::TransactionFormData},
    };

    use super::edit_transaction_endpoint;

    fn get_state(upstream: &StubServer) -> TransactionEndpointState {
        TransactionEndpointState {
            upstream: upstream_client(upstream),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn income_form() -> TransactionFormData {
        TransactionFormData {
            type_: Some("income".to_owned()),
            amount: "1500".to_owned(),
            accepted_amount: "1500".to_owned(),
            date: "2024-02-29".to_owned(),
            description: "Pay".to_owned(),
            category_id: Some(11),
        }
    }

    #[tokio::test]
    async fn patches_transaction_upstream() {
        let upstream = StubServer::spawn(StatusCode::OK, "{}").await;

        let response = edit_transaction_endpoint(
            State(get_state(&upstream)),
            Extension(AccessToken::new("secret")),
            Path("7".to_owned()),
            Form(income_form()),
        )
        .await;

        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
        let request = upstream.single_request();
        assert_eq!(request.method, Method::PATCH);
        assert_eq!(request.path, "/transactions/7");
        assert_eq!(
            request.json(),
            serde_json::json!({
                "amount": 150000,
                "type": "INCOME",
                "categoryID": 11,
                "description": "Pay",
                "date": "2024-02-29",
            })
        );
    }

    #[tokio::test]
    async fn zero_amount_is_not_sent() {
        let upstream = StubServer::spawn(StatusCode::OK, "{}").await;
        let mut form = income_form();
        form.amount = "0".to_owned();

        let response = edit_transaction_endpoint(
            State(get_state(&upstream)),
            Extension(AccessToken::new("secret")),
            Path("7".to_owned()),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let error = html
            .select(&scraper::Selector::parse("#amount-error").unwrap())
            .next()
            .expect("missing amount error");
        assert_eq!(
            error.text().collect::<String>(),
            "Amount must be greater than zero"
        );
        upstream.assert_no_requests();
    }

    #[tokio::test]
    async fn upstream_failure_shows_alert() {
        let upstream = StubServer::spawn(StatusCode::BAD_REQUEST, "bad").await;

        let response = edit_transaction_endpoint(
            State(get_state(&upstream)),
            Extension(AccessToken::new("secret")),
            Path("7".to_owned()),
            Form(income_form()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Failed to update transaction!"), "got {text}");
    }
}
