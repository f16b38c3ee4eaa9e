//! HTTP mapping for `CivicError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::common::CivicError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

pub fn status_for(err: &CivicError) -> StatusCode {
    match err {
        CivicError::Validation(_) => StatusCode::BAD_REQUEST,
        CivicError::InvalidTransition { .. } => StatusCode::CONFLICT,
        CivicError::NotFound { .. } => StatusCode::NOT_FOUND,
        CivicError::Conflict(_) => StatusCode::CONFLICT,
        CivicError::Permission(_) => StatusCode::FORBIDDEN,
        CivicError::Database(_) | CivicError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for CivicError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        // Store errors are logged here and never echoed to the client.
        let message = if self.is_fatal() {
            error!(error = %self, kind = self.kind(), "Request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorBody {
                error: self.kind(),
                message,
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, CivicError>;
