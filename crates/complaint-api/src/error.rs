use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use complaint_common::api::ErrorResponse;
use complaint_common::error::CommonError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("config error: {0}")]
    Config(String),
}

/// Errors returned from HTTP handlers, rendered as `{ "success": false, "error": ... }`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    TooManyRequests(String),
    Internal(String),
}

impl From<CommonError> for ApiError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::EmptyText => ApiError::BadRequest("text must not be empty".to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(ErrorResponse::new(msg))).into_response()
    }
}
