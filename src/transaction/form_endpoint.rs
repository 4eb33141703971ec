//! Re-renders the transaction form fields as the user fills them in.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxTriggerName;

use crate::{
    timezone::local_today,
    transaction::{
        create_page::TransactionFormPageState,
        form::{TransactionFormData, TransactionFormState, transaction_form_fields},
    },
};

/// A route handler that applies a change to one field of the transaction
/// form and returns the updated fields.
///
/// The `HX-Trigger-Name` header names the field that changed.
pub async fn refresh_transaction_form(
    State(state): State<TransactionFormPageState>,
    HxTriggerName(trigger_name): HxTriggerName,
    Form(data): Form<TransactionFormData>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let mut form = TransactionFormState::from_form_data(&data);
    form.change_date(&data.date, today);

    match trigger_name.as_deref() {
        Some("type_") => {
            if let Some(transaction_type) = form.transaction_type {
                form.change_type(transaction_type);
            }
        }
        Some("amount") => form.enter_amount(&data.amount),
        Some("date") => {}
        other => tracing::debug!("Refreshing transaction form for unknown trigger {other:?}"),
    }

    transaction_form_fields(&form, today).into_response()
}
