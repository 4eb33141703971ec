//! Validation rules shared by the transaction form, the transaction proxy and
//! image capture, so that they all accept and reject the same input.

use serde::Deserialize;
use time::Date;
use unicode_segmentation::UnicodeSegmentation;

use crate::transaction::{
    NewTransaction, TransactionType, TransactionUpdate, category::CategoryId, core::parse_date,
};

/// The maximum number of characters (grapheme clusters) in a description.
pub const MAX_DESCRIPTION_LENGTH: usize = 250;

/// The largest amount in cents that will be sent upstream (one trillion dollars).
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000_000;

/// Transaction fields as received from a client, before validation.
///
/// Uses the upstream field names so that a JSON request body can be read
/// directly. The amount is in cents.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UnvalidatedTransaction {
    /// The magnitude of the transaction in cents.
    #[serde(default)]
    pub amount: Option<f64>,
    /// "EXPENSE" or "INCOME".
    #[serde(default, rename = "type")]
    pub transaction_type: Option<String>,
    /// The ID of the category.
    #[serde(default, rename = "categoryID")]
    pub category_id: Option<CategoryId>,
    /// Text describing the transaction.
    #[serde(default)]
    pub description: Option<String>,
    /// The date as YYYY-MM-DD.
    #[serde(default)]
    pub date: Option<String>,
}

/// A reason why a transaction field was rejected.
///
/// The display text is shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The amount is missing when creating a transaction.
    #[error("Amount is required")]
    AmountRequired,

    /// The amount text could not be read as a number of dollars.
    #[error("Please enter a valid amount")]
    InvalidAmount,

    /// The amount is zero or negative.
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    /// The amount has a fractional number of cents.
    #[error("Amount must be a whole number of cents")]
    FractionalCents,

    /// The amount is larger than [MAX_AMOUNT_CENTS].
    #[error("Amount is too large")]
    AmountTooLarge,

    /// The type is missing when creating a transaction.
    #[error("Transaction type is required")]
    TypeRequired,

    /// The type is not one of the known transaction types.
    #[error("Transaction type must be either EXPENSE or INCOME")]
    InvalidType,

    /// The category is missing when creating a transaction.
    #[error("Category ID is required")]
    CategoryRequired,

    /// The date is missing when creating a transaction.
    #[error("Date is required")]
    DateRequired,

    /// The date is not in the format YYYY-MM-DD.
    #[error("Date must be in the format YYYY-MM-DD")]
    InvalidDate,

    /// Transactions record events that have already happened, so the date
    /// cannot be after the current local date.
    #[error("Date cannot be in the future")]
    FutureDate,

    /// The description is longer than [MAX_DESCRIPTION_LENGTH].
    #[error("Description cannot be longer than 250 characters")]
    DescriptionTooLong,
}

/// The first problem found with each field of a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    /// The problem with the amount, if any.
    pub amount: Option<ValidationError>,
    /// The problem with the transaction type, if any.
    pub transaction_type: Option<ValidationError>,
    /// The problem with the category, if any.
    pub category: Option<ValidationError>,
    /// The problem with the date, if any.
    pub date: Option<ValidationError>,
    /// The problem with the description, if any.
    pub description: Option<ValidationError>,
}

impl ValidationErrors {
    /// Whether every field passed validation.
    pub fn is_empty(&self) -> bool {
        self.first().is_none()
    }

    /// The first error in field order: amount, type, category, date, description.
    pub fn first(&self) -> Option<ValidationError> {
        self.amount
            .or(self.transaction_type)
            .or(self.category)
            .or(self.date)
            .or(self.description)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Create,
    Update,
}

/// Validate the fields for a new transaction, all fields except the description are required.
///
/// `today` is the current date in the user's timezone.
///
/// # Errors
///
/// Returns the problems found with each field.
pub fn validate_new(
    transaction: &UnvalidatedTransaction,
    today: Date,
) -> Result<NewTransaction, ValidationErrors> {
    let (update, errors) = check_fields(transaction, Mode::Create, today);

    if !errors.is_empty() {
        return Err(errors);
    }

    let (Some(amount), Some(transaction_type), Some(category_id), Some(date)) = (
        update.amount,
        update.transaction_type,
        update.category_id,
        update.date,
    ) else {
        // Required fields are reported by `check_fields`, this only satisfies the compiler.
        return Err(errors);
    };

    Ok(NewTransaction {
        amount,
        transaction_type,
        category_id,
        description: update.description.unwrap_or_default(),
        date,
    })
}

/// Validate a partial update, only the fields that are set are checked.
///
/// `today` is the current date in the user's timezone.
///
/// # Errors
///
/// Returns the problems found with each field.
pub fn validate_update(
    transaction: &UnvalidatedTransaction,
    today: Date,
) -> Result<TransactionUpdate, ValidationErrors> {
    let (update, errors) = check_fields(transaction, Mode::Update, today);

    if errors.is_empty() {
        Ok(update)
    } else {
        Err(errors)
    }
}

fn check_fields(
    transaction: &UnvalidatedTransaction,
    mode: Mode,
    today: Date,
) -> (TransactionUpdate, ValidationErrors) {
    let mut update = TransactionUpdate::default();
    let mut errors = ValidationErrors::default();

    match transaction.amount {
        Some(amount) => match check_amount(amount) {
            Ok(amount) => update.amount = Some(amount),
            Err(error) => errors.amount = Some(error),
        },
        None if mode == Mode::Create => errors.amount = Some(ValidationError::AmountRequired),
        None => {}
    }

    match non_empty(&transaction.transaction_type) {
        Some(text) => match text.parse::<TransactionType>() {
            Ok(transaction_type) => update.transaction_type = Some(transaction_type),
            Err(error) => errors.transaction_type = Some(error),
        },
        None if mode == Mode::Create => {
            errors.transaction_type = Some(ValidationError::TypeRequired)
        }
        None => {}
    }

    match transaction.category_id {
        Some(category_id) => update.category_id = Some(category_id),
        None if mode == Mode::Create => errors.category = Some(ValidationError::CategoryRequired),
        None => {}
    }

    match non_empty(&transaction.date) {
        Some(text) => match check_date(text, today) {
            Ok(date) => update.date = Some(date),
            Err(error) => errors.date = Some(error),
        },
        None if mode == Mode::Create => errors.date = Some(ValidationError::DateRequired),
        None => {}
    }

    if let Some(description) = &transaction.description {
        if description.graphemes(true).count() > MAX_DESCRIPTION_LENGTH {
            errors.description = Some(ValidationError::DescriptionTooLong);
        } else {
            update.description = Some(description.clone());
        }
    }

    (update, errors)
}

fn non_empty(text: &Option<String>) -> Option<&str> {
    text.as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

fn check_amount(amount: f64) -> Result<i64, ValidationError> {
    if amount.is_nan() || amount <= 0.0 {
        return Err(ValidationError::NonPositiveAmount);
    }

    if amount > MAX_AMOUNT_CENTS as f64 {
        return Err(ValidationError::AmountTooLarge);
    }

    if amount.fract() != 0.0 {
        return Err(ValidationError::FractionalCents);
    }

    Ok(amount as i64)
}

fn check_date(text: &str, today: Date) -> Result<Date, ValidationError> {
    let date = parse_date(text).map_err(|_| ValidationError::InvalidDate)?;

    if date > today {
        return Err(ValidationError::FutureDate);
    }

    Ok(date)
}
