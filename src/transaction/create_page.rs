//! Defines the route handler for the page for creating a new transaction.

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::Date;

use crate::{
    AppState, Error, endpoints,
    html::{
        BUTTON_SECONDARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        base, dollar_input_styles, loading_spinner,
    },
    navigation::NavBar,
    timezone::local_today,
    transaction::form::{FormAction, TransactionFormState, transaction_form},
};

fn capture_section() -> Markup {
    html! {
        section class="w-full space-y-4 pt-6 border-t border-gray-200 dark:border-gray-700"
        {
            h2 class="text-xl font-bold" { "Upload Transaction Image" }

            p class="text-sm text-gray-500 dark:text-gray-400"
            {
                "Upload a photo of your receipt instead of filling in the form."
            }

            form
                hx-post=(endpoints::CAPTURE_API)
                hx-encoding="multipart/form-data"
                hx-target-error="#alert-container"
                hx-indicator="#capture-indicator"
                hx-disabled-elt="#capture-button, #image"
                class="space-y-4"
            {
                div
                {
                    label for="image" class=(FORM_LABEL_STYLE) { "Image" }

                    input
                        name="image"
                        id="image"
                        type="file"
                        accept="image/*"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" id="capture-button" tabindex="0" class=(BUTTON_SECONDARY_STYLE)
                {
                    span id="capture-indicator" class="inline htmx-indicator"
                    {
                        (loading_spinner())
                        "Processing your image... "
                    }
                    "Create from Image"
                }
            }
        }
    }
}

fn create_transaction_view(max_date: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();
    let form_state = TransactionFormState::new(max_date);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            (transaction_form(&form_state, max_date, FormAction::Create))

            (capture_section())
        }
    };

    base("Create Transaction", &[dollar_input_styles()], &content)
}

/// The state needed to render the transaction form.
#[derive(Debug, Clone)]
pub struct TransactionFormPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionFormPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Renders the page for creating a transaction.
pub async fn get_create_transaction_page(
    State(state): State<TransactionFormPageState>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    Ok(create_transaction_view(today).into_response())
}
