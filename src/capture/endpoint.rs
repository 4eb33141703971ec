//! Creates a transaction from a photo of a receipt.

use axum::{
    Extension,
    extract::{FromRef, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use time::Date;

use crate::{
    AppState, Error,
    auth::AccessToken,
    capture::{CapturedImage, DescriptionClient, parse_described_transaction},
    endpoints,
    timezone::local_today,
    transaction::{NewTransaction, validate_new},
    upstream::UpstreamClient,
};

/// The name of the multipart field holding the image.
pub const IMAGE_FIELD: &str = "image";

/// The state needed to create a transaction from an image.
#[derive(Debug, Clone)]
pub struct CaptureState {
    /// Reads transactions out of images.
    pub describer: DescriptionClient,
    /// Where the transaction is created.
    pub upstream: UpstreamClient,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CaptureState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            describer: state.describer.clone(),
            upstream: state.upstream.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler that reads a transaction from an uploaded image and
/// creates it upstream.
///
/// The transaction goes through the same validation as the form, so a
/// misread image cannot create, e.g., a transaction dated in the future.
/// On success the client is redirected to the transactions page, otherwise
/// an alert explains what went wrong.
pub async fn capture_transaction_endpoint(
    State(state): State<CaptureState>,
    Extension(token): Extension<AccessToken>,
    multipart: Multipart,
) -> Response {
    let image = match read_image(multipart).await {
        Ok(image) => image,
        Err(error) => return error.into_alert_response(),
    };

    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let transaction = match describe_transaction(&state.describer, image, today).await {
        Ok(transaction) => transaction,
        Err(error) => return error.into_alert_response(),
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

async fn describe_transaction(
    describer: &DescriptionClient,
    image: CapturedImage,
    today: Date,
) -> Result<NewTransaction, Error> {
    let description = describer.describe(image).await?;
    let unvalidated = parse_described_transaction(&description)?
        .into_unvalidated()
        .map_err(Error::InvalidCapturedTransaction)?;

    validate_new(&unvalidated, today).map_err(|errors| {
        tracing::warn!("Image described an invalid transaction: {errors:?}");

        match errors.first() {
            Some(error) => Error::InvalidCapturedTransaction(error),
            None => Error::MalformedDescription(format!("{errors:?}")),
        }
    })
}

async fn read_image(mut multipart: Multipart) -> Result<CapturedImage, Error> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|error| Error::MultipartError(error.body_text()))?;

        if bytes.is_empty() {
            return Err(Error::MissingImage);
        }

        return Ok(CapturedImage {
            file_name,
            content_type,
            bytes,
        });
    }

    Err(Error::MissingImage)
}
