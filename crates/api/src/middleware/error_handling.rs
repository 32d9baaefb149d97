//! # Error Handling Middleware
//!
//! Maps [`BookingError`] onto HTTP status codes and `{"error": message}` JSON
//! bodies so every endpoint reports failures the same way.
//!
//! | Error | Status |
//! |---|---|
//! | `Validation` | 400 |
//! | `Forbidden` | 403 |
//! | `NotFound` | 404 |
//! | `Precondition`, `MissingSnapshot`, `Conflict` | 409 |
//! | `Busy` | 429 |
//! | `Subscription` | 503 |
//! | `Store`, `NotificationWrite` | 500 |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;
use tutorbook_core::errors::BookingError;

/// Application error wrapper that provides HTTP status code mapping
///
/// Handlers return `Result<_, AppError>` and use `?` on any
/// `BookingResult`; the conversion happens through the `From` impls below.
#[derive(Debug)]
pub struct AppError(pub BookingError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BookingError::Validation(_) => StatusCode::BAD_REQUEST,
            BookingError::Forbidden(_) => StatusCode::FORBIDDEN,
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Precondition(_)
            | BookingError::MissingSnapshot(_)
            | BookingError::Conflict(_) => StatusCode::CONFLICT,
            BookingError::Busy(_) => StatusCode::TOO_MANY_REQUESTS,
            BookingError::Subscription(_) => StatusCode::SERVICE_UNAVAILABLE,
            BookingError::Store(_) | BookingError::NotificationWrite(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }

        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

/// Allows `?` on `BookingResult` inside handlers.
impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError(err)
    }
}

/// Wraps adapter failures as store errors.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(BookingError::Store(err))
    }
}

/// Maps a BookingError straight to an HTTP response
pub fn map_error(err: BookingError) -> Response {
    AppError(err).into_response()
}
