use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use shared::error::{ApiError, ErrorCode};
use tracing::{error, warn};

use crate::views;

pub(crate) fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Invariant | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error boundary for HTML routes.
#[derive(Debug)]
pub(crate) struct PageError(pub(crate) ApiError);

impl From<ApiError> for PageError {
    fn from(value: ApiError) -> Self {
        Self(value)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.code);
        let message = match self.0.code {
            ErrorCode::NotFound | ErrorCode::Validation => {
                warn!(code = ?self.0.code, message = %self.0.message, "request rejected");
                self.0.message
            }
            ErrorCode::Invariant | ErrorCode::Internal => {
                error!(code = ?self.0.code, message = %self.0.message, "request failed");
                "Something went wrong while loading this page.".to_string()
            }
        };
        (status, Html(views::render_error_page(status, &message))).into_response()
    }
}

/// Error answer for loader requests that asked for JSON.
pub(crate) fn json_error(err: ApiError) -> Response {
    let status = status_for(err.code);
    if status.is_server_error() {
        error!(code = ?err.code, message = %err.message, "loader failed");
    }
    (status, Json(err)).into_response()
}
