//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    alert::Alert, endpoints, internal_server_error::InternalServerError, not_found::NotFoundError,
    transaction::ValidationError,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request has no access token, or upstream rejected the access token.
    #[error("the access token is missing or was rejected")]
    Unauthorized,

    /// Upstream rejected the email and password at log-in.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// A configured URL could not be parsed.
    #[error("invalid URL {0}")]
    InvalidUrl(String),

    /// Upstream responded with a non-success status code.
    ///
    /// The body is kept as text so it can be relayed to API clients.
    #[error("upstream responded with {status}: {body}")]
    UpstreamStatus {
        /// The status code from upstream.
        status: StatusCode,
        /// The response body from upstream.
        body: String,
    },

    /// The request to upstream could not be sent or the response could not be read.
    #[error("could not reach upstream: {0}")]
    UpstreamRequest(String),

    /// Upstream sent a success response with a body we could not understand.
    #[error("upstream sent an invalid response: {0}")]
    InvalidUpstreamResponse(String),

    /// The multipart form could not be parsed.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// The image capture form was submitted without an image.
    #[error("no image was uploaded")]
    MissingImage,

    /// The description service reported an error.
    #[error("the description service failed: {0}")]
    DescriptionServiceError(String),

    /// The description service did not return a transaction as JSON.
    #[error("could not parse the transaction from the image description: {0}")]
    MalformedDescription(String),

    /// The transaction read from an image failed validation.
    #[error("the transaction read from the image is invalid: {0}")]
    InvalidCapturedTransaction(ValidationError),
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        tracing::error!("Request to upstream failed: {error}");
        Error::UpstreamRequest(error.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            // Logging out clears the stale token before going to the log-in page.
            Error::Unauthorized => Redirect::to(endpoints::LOG_OUT).into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::Unauthorized => {
                return (HxRedirect(endpoints::LOG_OUT.to_owned()), StatusCode::OK).into_response();
            }
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::MissingImage => (
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: "Please select an image first".to_owned(),
                },
            ),
            Error::MultipartError(_) => (
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Could not read the upload",
                    "The uploaded file could not be read. Try selecting the image again.",
                ),
            ),
            Error::DescriptionServiceError(message) => (
                StatusCode::BAD_GATEWAY,
                Alert::Error {
                    message: "Failed to process image".to_owned(),
                    details: message,
                },
            ),
            Error::MalformedDescription(_) => (
                StatusCode::BAD_GATEWAY,
                Alert::error(
                    "Could not read a transaction from the image",
                    "The image description did not contain a transaction. \
                    Try another image or fill in the form instead.",
                ),
            ),
            Error::InvalidCapturedTransaction(error) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Alert::Error {
                    message: "The transaction read from the image is invalid".to_owned(),
                    details: format!("{error}. Fill in the form instead."),
                },
            ),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Something went wrong".to_owned(),
                        details:
                            "An unexpected error occurred, check the server logs for more details."
                                .to_owned(),
                    },
                )
            }
        };

        (status_code, alert.into_html()).into_response()
    }

    /// Convert an error from an upstream call into an HTML alert headed by `message`,
    /// e.g. "Failed to create new transaction!".
    ///
    /// A rejected token still logs the user out.
    pub fn into_upstream_alert_response(self, message: &str) -> Response {
        let (status_code, details) = match self {
            Error::Unauthorized => return Error::Unauthorized.into_alert_response(),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                "The transaction no longer exists.".to_owned(),
            ),
            Error::UpstreamStatus { status, body } => {
                tracing::error!("{message} Upstream responded with {status}: {body}");
                (
                    status,
                    format!("The transaction service responded with \"{status}\". Try again later."),
                )
            }
            Error::UpstreamRequest(error) => {
                tracing::error!("{message} {error}");
                (
                    StatusCode::BAD_GATEWAY,
                    "Could not reach the transaction service. Try again later.".to_owned(),
                )
            }
            error => {
                tracing::error!("{message} {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred, check the server logs for more details."
                        .to_owned(),
                )
            }
        };

        (status_code, Alert::error(message, &details).into_html()).into_response()
    }
}
