//! Defines the transaction models exchanged with the upstream API.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{Date, macros::format_description};

use crate::transaction::{category::CategoryId, validation::ValidationError};

/// Whether money was spent or earned.
///
/// The upstream API expects the upper case names `EXPENSE` and `INCOME`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Money spent.
    Expense,
    /// Money earned.
    Income,
}

impl TransactionType {
    /// The name used by the upstream API, e.g. "EXPENSE".
    pub fn as_upstream_str(&self) -> &'static str {
        match self {
            TransactionType::Expense => "EXPENSE",
            TransactionType::Income => "INCOME",
        }
    }

    /// The value used for form inputs, e.g. "expense".
    pub fn as_form_value(&self) -> &'static str {
        match self {
            TransactionType::Expense => "expense",
            TransactionType::Income => "income",
        }
    }

    /// The human readable name, e.g. "Expense".
    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::Expense => "Expense",
            TransactionType::Income => "Income",
        }
    }
}

impl FromStr for TransactionType {
    type Err = ValidationError;

    /// Parses "expense" or "income", ignoring case.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text.eq_ignore_ascii_case("expense") {
            Ok(TransactionType::Expense)
        } else if text.eq_ignore_ascii_case("income") {
            Ok(TransactionType::Income)
        } else {
            Err(ValidationError::InvalidType)
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The opaque identifier the upstream API assigns to a transaction.
///
/// Upstream may send the ID as either a JSON number or a string, it is kept
/// as a string since it is only ever echoed back in URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawTransactionId")]
pub struct TransactionId(String);

impl TransactionId {
    /// Create an ID from the text of a URL path segment.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The ID as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTransactionId {
    Number(i64),
    Text(String),
}

impl From<RawTransactionId> for TransactionId {
    fn from(raw: RawTransactionId) -> Self {
        match raw {
            RawTransactionId::Number(number) => Self(number.to_string()),
            RawTransactionId::Text(text) => Self(text),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Whole(i64),
    Fractional(f64),
    Text(String),
}

fn deserialize_cents<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    use serde::de::Error as _;

    let cents = match RawAmount::deserialize(deserializer)? {
        RawAmount::Whole(cents) => return Ok(cents),
        RawAmount::Fractional(cents) => cents,
        RawAmount::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid amount {text:?}")))?,
    };
    let rounded = cents.round();

    if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
        Ok(rounded as i64)
    } else {
        Err(D::Error::custom(format!("amount {cents} is out of range")))
    }
}

/// An expense or income as stored by the upstream API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID assigned by upstream.
    pub id: TransactionId,
    /// The amount in cents.
    ///
    /// Older records may carry a negative sign for expenses, use the absolute
    /// value together with [Transaction::transaction_type]. Records that were
    /// stored with a fractional amount or as a string are rounded to whole cents.
    #[serde(deserialize_with = "deserialize_cents")]
    pub amount: i64,
    /// Whether the transaction is an expense or income.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The ID of the category in the client-side category table.
    #[serde(rename = "categoryID")]
    pub category_id: CategoryId,
    /// A text description of what the transaction was for.
    #[serde(default)]
    pub description: Option<String>,
    /// When the transaction happened.
    #[serde(with = "date_format")]
    pub date: Date,
}

/// The payload for creating a transaction upstream.
///
/// The amount is always the positive magnitude in cents, the type carries the
/// direction of the money.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTransaction {
    /// The magnitude of the transaction in cents.
    pub amount: i64,
    /// Whether the transaction is an expense or income.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The ID of the category in the client-side category table.
    #[serde(rename = "categoryID")]
    pub category_id: CategoryId,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    #[serde(with = "date_format")]
    pub date: Date,
}

/// A partial update to a transaction, only the fields that are set are sent upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionUpdate {
    /// The new magnitude in cents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    /// The new transaction type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<TransactionType>,
    /// The new category.
    #[serde(rename = "categoryID", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    /// The new description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The new date.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "date_format::serialize_option"
    )]
    pub date: Option<Date>,
}

impl From<NewTransaction> for TransactionUpdate {
    fn from(transaction: NewTransaction) -> Self {
        Self {
            amount: Some(transaction.amount),
            transaction_type: Some(transaction.transaction_type),
            category_id: Some(transaction.category_id),
            description: Some(transaction.description),
            date: Some(transaction.date),
        }
    }
}

/// Parse a date in the format YYYY-MM-DD.
pub fn parse_date(text: &str) -> Result<Date, time::error::Parse> {
    Date::parse(text, format_description!("[year]-[month]-[day]"))
}

/// Dates are sent as YYYY-MM-DD.
///
/// Upstream may respond with a full ISO 8601 date-time, in which case only the
/// date part is kept.
mod date_format {
    use serde::de::Error as _;

    use super::*;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(date)
    }

    pub fn serialize_option<S: Serializer>(
        date: &Option<Date>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.collect_str(date),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let text = String::deserialize(deserializer)?;
        let date_part = text.get(..10).unwrap_or(&text);

        parse_date(date_part).map_err(D::Error::custom)
    }
}
