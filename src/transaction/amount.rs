//! Parsing and display rules for money amounts.
//!
//! Users type amounts in dollars with at most two decimal places, the upstream
//! API works in integer cents.

use crate::transaction::TransactionType;

/// The longest amount the amount input accepts, including the sign.
pub const MAX_AMOUNT_LENGTH: usize = 12;

/// Errors for text that cannot be read as an amount of dollars.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AmountError {
    /// The text had no digits.
    #[error("the amount is empty")]
    Empty,

    /// The text is not a decimal number with at most two decimal places.
    #[error("\"{0}\" is not a valid amount")]
    Invalid(String),

    /// The amount does not fit in the range of cents we can represent.
    #[error("the amount is too large")]
    TooLarge,
}

/// Whether `text` is an acceptable partial entry for the amount input.
///
/// Accepts an optional leading minus sign, digits and at most one decimal point
/// followed by at most two digits. Incomplete entries such as "-", "." and "12."
/// are allowed so that the user can keep typing.
pub fn is_amount_entry(text: &str) -> bool {
    if text.len() > MAX_AMOUNT_LENGTH {
        return false;
    }

    let unsigned = text.strip_prefix('-').unwrap_or(text);

    match unsigned.split_once('.') {
        Some((whole, fraction)) => {
            is_all_digits(whole) && is_all_digits(fraction) && fraction.len() <= 2
        }
        None => is_all_digits(unsigned),
    }
}

fn is_all_digits(text: &str) -> bool {
    text.bytes().all(|byte| byte.is_ascii_digit())
}

/// Parse a dollar amount such as "-12.5" into signed cents, e.g. -1250.
///
/// # Errors
///
/// Returns an [AmountError] if `text` has no digits, more than two decimal
/// places, or any character other than a leading minus sign, digits and one
/// decimal point.
pub fn parse_cents(text: &str) -> Result<i64, AmountError> {
    let text = text.trim();
    let (is_negative, unsigned) = match text.strip_prefix('-') {
        Some(unsigned) => (true, unsigned),
        None => (false, text),
    };

    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    if whole.is_empty() && fraction.is_empty() {
        return Err(AmountError::Empty);
    }

    if !is_all_digits(whole) || !is_all_digits(fraction) || fraction.len() > 2 {
        return Err(AmountError::Invalid(text.to_owned()));
    }

    let dollars: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| AmountError::TooLarge)?
    };

    let cents: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| AmountError::TooLarge)? * 10,
        _ => fraction.parse().map_err(|_| AmountError::TooLarge)?,
    };

    let total = dollars
        .checked_mul(100)
        .and_then(|total| total.checked_add(cents))
        .ok_or(AmountError::TooLarge)?;

    Ok(if is_negative { -total } else { total })
}

/// Convert a dollar amount from a float into a positive number of cents.
///
/// Returns `None` if `dollars` is not finite or too large.
pub fn dollars_to_cents(dollars: f64) -> Option<i64> {
    let cents = (dollars.abs() * 100.0).round();

    (cents.is_finite() && cents < i64::MAX as f64).then_some(cents as i64)
}

/// Format a magnitude in cents as dollars with two decimal places and no
/// currency symbol, e.g. "5.00".
pub fn format_unsigned_dollars(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// Apply an edit of the amount input.
///
/// `accepted` is the last accepted value and `entered` is the new text in the
/// input. If `entered` is not a valid amount entry, e.g. it has three decimal
/// places, the edit is rejected and `accepted` is returned unchanged.
/// Otherwise expenses gain a leading minus sign and income loses it.
pub fn apply_amount_entry(
    accepted: &str,
    entered: &str,
    transaction_type: Option<TransactionType>,
) -> String {
    if !is_amount_entry(entered) {
        return accepted.to_owned();
    }

    match transaction_type {
        Some(TransactionType::Expense) if !entered.is_empty() && !entered.starts_with('-') => {
            format!("-{entered}")
        }
        Some(TransactionType::Income) => entered.strip_prefix('-').unwrap_or(entered).to_owned(),
        _ => entered.to_owned(),
    }
}

/// Reformat `amount` for a change of transaction type.
///
/// Amounts that parse are shown with two decimal places, negative for
/// expenses and positive for income. Anything else is returned unchanged.
pub fn sign_amount_for_type(amount: &str, transaction_type: TransactionType) -> String {
    match parse_cents(amount) {
        Ok(cents) => {
            let magnitude = format_unsigned_dollars(cents.unsigned_abs());

            match transaction_type {
                TransactionType::Expense => format!("-{magnitude}"),
                TransactionType::Income => magnitude,
            }
        }
        Err(_) => amount.to_owned(),
    }
}
