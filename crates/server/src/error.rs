//! HTTP rendering for control-surface errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use livedev_core::Error;

/// Wrapper giving core errors an HTTP rendering on the control surface.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidInput(_) | Error::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            Error::Database(_) | Error::MigrationFailed(_) | Error::StoreIo(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::HttpError(_) | Error::ErrorDocUnavailable(_) => StatusCode::BAD_GATEWAY,
        };

        (status, self.0.to_string()).into_response()
    }
}
