//! Client for the description service, which reads a transaction out of a
//! photo of a receipt or bank statement, and the parser for its reply.

use axum::body::Bytes;
use reqwest::{
    Url,
    multipart::{Form, Part},
};
use serde::Deserialize;

use crate::{
    Error,
    transaction::{
        TransactionType, UnvalidatedTransaction, ValidationError, amount::dollars_to_cents,
        category::fallback_category,
    },
};

/// An image uploaded by the user.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    /// The name of the file on the user's device.
    pub file_name: Option<String>,
    /// The MIME type reported by the browser, e.g. "image/png".
    pub content_type: Option<String>,
    /// The image data.
    pub bytes: Bytes,
}

/// Client for the image description service.
#[derive(Debug, Clone)]
pub struct DescriptionClient {
    http: reqwest::Client,
    url: Url,
}

#[derive(Deserialize)]
struct DescribeResponse {
    description: Option<String>,
    error: Option<String>,
}

impl DescriptionClient {
    /// Create a client that posts images to `url`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidUrl] if `url` is not an absolute URL.
    pub fn new(url: &str) -> Result<Self, Error> {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Create a client that sends requests with `http`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidUrl] if `url` is not an absolute URL.
    pub fn with_client(http: reqwest::Client, url: &str) -> Result<Self, Error> {
        let parsed_url =
            Url::parse(url).map_err(|error| Error::InvalidUrl(format!("{url}: {error}")))?;

        Ok(Self {
            http,
            url: parsed_url,
        })
    }

    /// Ask the service to describe `image`, returning the raw description text.
    ///
    /// # Errors
    ///
    /// Returns [Error::DescriptionServiceError] if the service reports an
    /// error, or [Error::UpstreamRequest] if it cannot be reached.
    pub async fn describe(&self, image: CapturedImage) -> Result<String, Error> {
        let mut part = Part::bytes(image.bytes.to_vec())
            .file_name(image.file_name.unwrap_or_else(|| "image".to_owned()));

        if let Some(content_type) = image.content_type {
            part = part.mime_str(&content_type)?;
        }

        let response = self
            .http
            .post(self.url.clone())
            .multipart(Form::new().part("image", part))
            .send()
            .await?;

        let status = response.status();
        let body: Option<DescribeResponse> = response.json().await.ok();

        match body {
            Some(DescribeResponse {
                description: Some(description),
                ..
            }) if status.is_success() => Ok(description),
            Some(DescribeResponse {
                error: Some(error), ..
            }) => Err(Error::DescriptionServiceError(error)),
            _ if status.is_success() => Err(Error::MalformedDescription(
                "the reply has no description".to_owned(),
            )),
            _ => Err(Error::DescriptionServiceError(format!(
                "the service responded with {status}"
            ))),
        }
    }
}

/// An amount as written by the model, either a number or a string of digits.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum DescribedAmount {
    Number(f64),
    Text(String),
}

/// The transaction fields found in an image description.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DescribedTransaction {
    amount: Option<DescribedAmount>,
    #[serde(rename = "type")]
    transaction_type: Option<String>,
    description: Option<String>,
    date: Option<String>,
}

/// Parse the JSON object in `description`, which may be wrapped in a
/// Markdown code fence.
///
/// # Errors
///
/// Returns [Error::MalformedDescription] if the text is not a JSON object
/// with the transaction fields.
pub fn parse_described_transaction(description: &str) -> Result<DescribedTransaction, Error> {
    let json = strip_code_fence(description);

    serde_json::from_str(json).map_err(|error| {
        tracing::warn!("Could not parse image description {description:?}: {error}");
        Error::MalformedDescription(error.to_string())
    })
}

fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();

    let Some(start) = text.find("```") else {
        return text;
    };

    let fenced = &text[start + 3..];
    let fenced = fenced.strip_prefix("json").unwrap_or(fenced);

    match fenced.find("```") {
        Some(end) => fenced[..end].trim(),
        None => fenced.trim(),
    }
}

impl DescribedTransaction {
    /// Convert to the fields checked by the shared validation rules.
    ///
    /// The amount is converted from dollars to positive cents and the
    /// category is the catch-all category for the transaction type.
    ///
    /// # Errors
    ///
    /// Returns [ValidationError::InvalidAmount] if the amount is text that is
    /// not a number.
    pub fn into_unvalidated(self) -> Result<UnvalidatedTransaction, ValidationError> {
        let dollars = match self.amount {
            Some(DescribedAmount::Number(dollars)) => Some(dollars),
            Some(DescribedAmount::Text(text)) => Some(
                text.trim()
                    .trim_start_matches('$')
                    .replace(',', "")
                    .parse::<f64>()
                    .map_err(|_| ValidationError::InvalidAmount)?,
            ),
            None => None,
        };
        let amount = match dollars {
            Some(dollars) => {
                let cents = dollars_to_cents(dollars).ok_or(ValidationError::InvalidAmount)?;
                Some(cents as f64)
            }
            None => None,
        };

        let transaction_type = self
            .transaction_type
            .as_deref()
            .map(str::parse::<TransactionType>);
        // Only a recognised expense gets the expense category, validation
        // rejects any type that does not parse.
        let category_id = match transaction_type {
            Some(Ok(TransactionType::Expense)) => fallback_category(TransactionType::Expense),
            _ => fallback_category(TransactionType::Income),
        };

        Ok(UnvalidatedTransaction {
            amount,
            transaction_type: self.transaction_type,
            category_id: Some(category_id),
            description: self.description,
            date: self.date,
        })
    }
}
