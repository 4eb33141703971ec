//! The state of the transaction form and the markup for its fields.
//!
//! The form is rendered on the server. Whenever the type, amount or date
//! changes, HTMX posts the form to [endpoints::TRANSACTION_FORM_API] and swaps
//! in the re-rendered fields, so the rules below run on every keystroke.

use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, loading_spinner,
    },
    transaction::{
        NewTransaction, Transaction, TransactionType, UnvalidatedTransaction, ValidationError,
        ValidationErrors,
        amount::{
            AmountError, MAX_AMOUNT_LENGTH, apply_amount_entry, format_unsigned_dollars,
            is_amount_entry, parse_cents, sign_amount_for_type,
        },
        category::{CategoryId, categories_for, default_category},
        core::parse_date,
        validate_new,
        validation::MAX_DESCRIPTION_LENGTH,
    },
};

/// The ID of the element that wraps the form fields and is replaced on refresh.
pub const FORM_FIELDS_ID: &str = "transaction-form-fields";

/// The values shown in the transaction form and the errors found in them.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFormState {
    /// The selected type, if the user has picked one.
    pub transaction_type: Option<TransactionType>,
    /// The amount as shown in the input, e.g. "-12.50".
    pub amount: String,
    /// The date as shown in the input, e.g. "2025-01-31".
    pub date: String,
    /// Free text describing the transaction.
    pub description: String,
    /// The selected category.
    pub category_id: CategoryId,
    /// The problems to show next to each field.
    pub errors: ValidationErrors,
}

impl TransactionFormState {
    /// An empty form dated `today`.
    pub fn new(today: Date) -> Self {
        Self {
            transaction_type: None,
            amount: String::new(),
            date: today.to_string(),
            description: String::new(),
            category_id: default_category(TransactionType::Expense),
            errors: ValidationErrors::default(),
        }
    }

    /// A form filled in with an existing transaction.
    ///
    /// The amount is shown as its magnitude in dollars, e.g. -500 cents is shown as "5.00".
    pub fn from_transaction(transaction: &Transaction) -> Self {
        Self {
            transaction_type: Some(transaction.transaction_type),
            amount: format_unsigned_dollars(transaction.amount.unsigned_abs()),
            date: transaction.date.to_string(),
            description: transaction.description.clone().unwrap_or_default(),
            category_id: transaction.category_id,
            errors: ValidationErrors::default(),
        }
    }

    /// Rebuild the state from a submitted form.
    ///
    /// The amount comes from `accepted_amount`, the last value the server
    /// accepted, so that a rejected keystroke does not make it into the state.
    pub fn from_form_data(data: &TransactionFormData) -> Self {
        let transaction_type = data
            .type_
            .as_deref()
            .and_then(|text| text.parse::<TransactionType>().ok());
        let category_id = data.category_id.unwrap_or_else(|| {
            default_category(transaction_type.unwrap_or(TransactionType::Expense))
        });

        Self {
            transaction_type,
            amount: data.accepted_amount.clone(),
            date: data.date.clone(),
            description: data.description.clone(),
            category_id,
            errors: ValidationErrors::default(),
        }
    }

    /// Select a transaction type.
    ///
    /// The category goes back to the default for the type and a valid amount
    /// is reformatted with the sign for the type.
    pub fn change_type(&mut self, transaction_type: TransactionType) {
        self.transaction_type = Some(transaction_type);
        self.errors.transaction_type = None;
        self.errors.category = None;
        self.category_id = default_category(transaction_type);
        self.amount = sign_amount_for_type(&self.amount, transaction_type);
    }

    /// Handle a keystroke in the amount input.
    ///
    /// Entries with invalid characters or more than two decimal places are
    /// rejected and leave the amount unchanged.
    pub fn enter_amount(&mut self, entered: &str) {
        if is_amount_entry(entered) {
            self.errors.amount = None;
        }

        self.amount = apply_amount_entry(&self.amount, entered, self.transaction_type);
    }

    /// Change the date, flagging dates after `today`.
    pub fn change_date(&mut self, date: &str, today: Date) {
        self.date = date.to_owned();
        self.errors.date = match parse_date(date) {
            Ok(date) if date > today => Some(ValidationError::FutureDate),
            _ => None,
        };
    }

    /// Validate the form for submission.
    ///
    /// # Errors
    ///
    /// Returns the problems with each field, which are also stored in the
    /// state so they can be shown next to the fields.
    pub fn submit(&mut self, today: Date) -> Result<NewTransaction, ValidationErrors> {
        let amount = match parse_cents(&self.amount) {
            Ok(cents) => Ok(Some(cents.unsigned_abs() as f64)),
            Err(AmountError::Empty) => Ok(None),
            Err(AmountError::Invalid(_)) => Err(ValidationError::InvalidAmount),
            Err(AmountError::TooLarge) => Err(ValidationError::AmountTooLarge),
        };

        let unvalidated = UnvalidatedTransaction {
            amount: amount.unwrap_or(None),
            transaction_type: self
                .transaction_type
                .map(|transaction_type| transaction_type.as_upstream_str().to_owned()),
            category_id: self.transaction_type.map(|_| self.category_id),
            description: Some(self.description.trim().to_owned()),
            date: Some(self.date.clone()),
        };

        let result = validate_new(&unvalidated, today);

        let mut errors = match &result {
            Ok(_) => ValidationErrors::default(),
            Err(errors) => errors.clone(),
        };
        if let Err(error) = amount {
            errors.amount = Some(error);
        }
        self.errors = errors.clone();

        match result {
            Ok(transaction) if errors.is_empty() => Ok(transaction),
            _ => Err(errors),
        }
    }
}

/// The raw values posted by the transaction form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionFormData {
    /// "expense" or "income", missing until the user picks one.
    #[serde(default)]
    pub type_: Option<String>,
    /// The text currently in the amount input.
    #[serde(default)]
    pub amount: String,
    /// The last amount the server accepted.
    #[serde(default)]
    pub accepted_amount: String,
    /// The date as YYYY-MM-DD.
    #[serde(default)]
    pub date: String,
    /// Free text describing the transaction.
    #[serde(default)]
    pub description: String,
    /// The selected category, missing while the select is disabled.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

/// Where a submitted transaction form is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction<'a> {
    /// POST a new transaction to [endpoints::TRANSACTIONS_API].
    Create,
    /// PUT the changes to the edit URL of an existing transaction.
    Update(&'a str),
}

/// Render the complete transaction form, including the submit button.
///
/// Validation errors re-render the fields in place, other errors are shown
/// as an alert.
pub fn transaction_form(
    state: &TransactionFormState,
    max_date: Date,
    action: FormAction<'_>,
) -> Markup {
    let (heading, button_text) = match action {
        FormAction::Create => ("New Transaction", "Create Transaction"),
        FormAction::Update(_) => ("Edit Transaction", "Save Changes"),
    };
    let (hx_post, hx_put) = match action {
        FormAction::Create => (Some(endpoints::TRANSACTIONS_API), None),
        FormAction::Update(url) => (None, Some(url)),
    };

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-target=(format!("#{FORM_FIELDS_ID}"))
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="w-full space-y-4 md:space-y-6"
        {
            h2 class="text-xl font-bold" { (heading) }

            (transaction_form_fields(state, max_date))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span id="indicator" class="inline htmx-indicator"
                {
                    (loading_spinner())
                }
                (button_text)
            }
        }
    }
}

fn error_message(id: &str, error: Option<ValidationError>) -> Markup {
    html! {
        @if let Some(error) = error {
            p id=(id) class=(FORM_ERROR_STYLE) { (error) }
        }
    }
}

/// Render the form fields for `state`.
///
/// `max_date` is the latest date the date picker offers, i.e. today.
pub fn transaction_form_fields(state: &TransactionFormState, max_date: Date) -> Markup {
    let types = [TransactionType::Expense, TransactionType::Income];
    let refresh_url = endpoints::TRANSACTION_FORM_API;
    let refresh_target = format!("#{FORM_FIELDS_ID}");
    let amount_placeholder = match state.transaction_type {
        Some(TransactionType::Expense) => "-0.00",
        _ => "0.00",
    };

    html! {
        div id=(FORM_FIELDS_ID) class="space-y-4 md:space-y-6"
        {
            fieldset class="space-y-2"
            {
                legend class=(FORM_LABEL_STYLE) { "Transaction type" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    @for transaction_type in types {
                        @let id = format!("transaction-type-{}", transaction_type.as_form_value());

                        div class="flex items-center gap-3"
                        {
                            input
                                name="type_"
                                id=(id)
                                type="radio"
                                value=(transaction_type.as_form_value())
                                checked[state.transaction_type == Some(transaction_type)]
                                required
                                tabindex="0"
                                hx-post=(refresh_url)
                                hx-trigger="change"
                                hx-target=(refresh_target)
                                hx-swap="outerHTML"
                                class=(FORM_RADIO_INPUT_STYLE);

                            label for=(id) class=(FORM_RADIO_LABEL_STYLE)
                            {
                                (transaction_type.label())
                            }
                        }
                    }
                }

                (error_message("type-error", state.errors.transaction_type))
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input type="hidden" name="accepted_amount" value=(state.amount);

                // w-full needed to ensure input takes the full width when prefilled with a value
                div class="input-wrapper w-full"
                {
                    input
                        name="amount"
                        id="amount"
                        type="text"
                        inputmode="decimal"
                        autocomplete="off"
                        maxlength=(MAX_AMOUNT_LENGTH)
                        placeholder=(amount_placeholder)
                        value=(state.amount)
                        required
                        hx-post=(refresh_url)
                        hx-trigger="input changed delay:150ms"
                        hx-target=(refresh_target)
                        hx-swap="outerHTML"
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                (error_message("amount-error", state.errors.amount))
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select
                    name="category_id"
                    id="category_id"
                    disabled[state.transaction_type.is_none()]
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    @match state.transaction_type {
                        Some(transaction_type) => {
                            @for category in categories_for(transaction_type) {
                                option
                                    value=(category.id)
                                    selected[category.id == state.category_id]
                                {
                                    (category.name)
                                }
                            }
                        }
                        None => {
                            option value="" { "Choose a transaction type first" }
                        }
                    }
                }

                (error_message("category-error", state.errors.category))
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    name="date"
                    id="date"
                    type="date"
                    max=(max_date)
                    value=(state.date)
                    required
                    hx-post=(refresh_url)
                    hx-trigger="change"
                    hx-target=(refresh_target)
                    hx-swap="outerHTML"
                    class=(FORM_TEXT_INPUT_STYLE);

                (error_message("date-error", state.errors.date))
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    name="description"
                    id="description"
                    type="text"
                    placeholder="Description"
                    maxlength=(MAX_DESCRIPTION_LENGTH)
                    value=(state.description)
                    class=(FORM_TEXT_INPUT_STYLE);

                (error_message("description-error", state.errors.description))
            }
        }
    }
}



#[cfg(test)]
mod form_data_tests {
    use super::TransactionFormData;

    #[test]
    fn empty_fields_are_none() {
        let form_data = "amount=&accepted_amount=&date=2025-01-01&description=&category_id=";

        let got: TransactionFormData = serde_html_form::from_str(form_data).unwrap();

        assert_eq!(got.type_, None);
        assert_eq!(got.category_id, None);
        assert_eq!(got.date, "2025-01-01");
    }

    #[test]
    fn parses_filled_in_form() {
        let form_data = "type_=income&amount=12.5&accepted_amount=12.5&date=2025-01-01\
            &description=Pay&category_id=11";

        let got: TransactionFormData = serde_html_form::from_str(form_data).unwrap();

        assert_eq!(
            got,
            TransactionFormData {
                type_: Some("income".to_owned()),
                amount: "12.5".to_owned(),
                accepted_amount: "12.5".to_owned(),
                date: "2025-01-01".to_owned(),
                description: "Pay".to_owned(),
                category_id: Some(11),
            }
        );
    }
}
