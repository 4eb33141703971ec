//! Defines the route handler for the page for editing a transaction.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use maud::html;

use crate::{
    Error,
    auth::AccessToken,
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, LINK_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    timezone::local_today,
    transaction::{
        TransactionId,
        create_endpoint::TransactionEndpointState,
        form::{FormAction, TransactionFormState, transaction_form},
    },
};

/// Renders the page for editing a transaction.
///
/// The transaction is fetched from upstream so the form always starts from
/// the stored values.
pub async fn get_edit_transaction_page(
    State(state): State<TransactionEndpointState>,
    Extension(token): Extension<AccessToken>,
    Path(transaction_id): Path<String>,
) -> Result<Response, Error> {
    let transaction_id = TransactionId::new(transaction_id);
    let today = local_today(&state.local_timezone)?;

    let transaction = state
        .upstream
        .get_transaction(&token, &transaction_id)
        .await
        .inspect_err(|error| {
            tracing::error!("Failed to retrieve transaction {transaction_id}: {error}")
        })?;

    let form_state = TransactionFormState::from_transaction(&transaction);
    let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, &transaction_id);
    let nav_bar = NavBar::new(endpoints::EDIT_TRANSACTION_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            (transaction_form(&form_state, today, FormAction::Update(&edit_url)))

            a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "Cancel" }
        }
    };

    Ok(base("Edit Transaction", &[dollar_input_styles()], &content).into_response())
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };

    use crate::{
        Error,
        auth::AccessToken,
        test_utils::{
            StubServer, assert_form_input_with_value, assert_hx_endpoint, assert_valid_html,
            must_get_form, parse_html_document, upstream_client,
        },
        transaction::create_endpoint::TransactionEndpointState,
    };

    use super::get_edit_transaction_page;

    fn get_state(upstream: &StubServer) -> TransactionEndpointState {
        TransactionEndpointState {
            upstream: upstream_client(upstream),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    #[tokio::test]
    async fn form_is_populated_from_upstream() {
        let upstream = StubServer::spawn(
            StatusCode::OK,
            r#"{"id": 42, "amount": -500, "type": "EXPENSE", "categoryID": 3,
                "description": "Bus", "date": "2024-01-03T00:00:00.000Z"}"#,
        )
        .await;

        let response = get_edit_transaction_page(
            State(get_state(&upstream)),
            Extension(AccessToken::new("secret")),
            Path("42".to_owned()),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(upstream.single_request().path, "/transactions/42");

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, "/transactions/42/edit", "hx-put");
        assert_form_input_with_value(&form, "amount", "text", "5.00");
        assert_form_input_with_value(&form, "date", "date", "2024-01-03");

        let selected_category = form
            .select(&scraper::Selector::parse("option[selected]").unwrap())
            .next()
            .and_then(|option| option.value().attr("value"));
        assert_eq!(selected_category, Some("3"));
    }

    #[tokio::test]
    async fn fractional_amount_is_rounded_to_cents() {
        let upstream = StubServer::spawn(
            StatusCode::OK,
            r#"{"id": 7, "amount": 1250.4, "type": "INCOME", "categoryID": 11,
                "date": "2024-01-03"}"#,
        )
        .await;

        let response = get_edit_transaction_page(
            State(get_state(&upstream)),
            Extension(AccessToken::new("secret")),
            Path("7".to_owned()),
        )
        .await
        .unwrap();

        let document = parse_html_document(response).await;
        let form = must_get_form(&document);
        assert_form_input_with_value(&form, "amount", "text", "12.50");
    }

    #[tokio::test]
    async fn missing_transaction_is_not_found() {
        let upstream = StubServer::spawn(StatusCode::NOT_FOUND, "").await;

        let result = get_edit_transaction_page(
            State(get_state(&upstream)),
            Extension(AccessToken::new("secret")),
            Path("42".to_owned()),
        )
        .await;

        assert_eq!(result.unwrap_err(), Error::NotFound);
        let response = Error::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
