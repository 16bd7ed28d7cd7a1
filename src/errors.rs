use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;

use crate::presentation::ErrorState;

/// Application-specific error types.
///
/// The detail strings carried by the variants are for the log only. What the
/// caller sees is [`AppError::user_message`].
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// No document was supplied with the request.
    InputMissing,
    /// Network failure, non-2xx status or timeout talking to the extraction service.
    UpstreamTransport(String),
    /// The extraction service answered, but its payload cannot be turned into a record.
    ResponseParse(String),
    /// Malformed request (e.g. broken multipart body).
    BadRequest(String),
    /// Unauthorized access error.
    Unauthorized(String),
    /// Internal server error.
    Internal(String),
}

impl AppError {
    /// The one-line message shown in the error banner.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::InputMissing => "Please upload a PDF file.",
            AppError::UpstreamTransport(_) => "A network error occurred.",
            AppError::ResponseParse(_) => "Error processing response data.",
            AppError::BadRequest(_) => "The upload request could not be read.",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Internal(_) => "Internal server error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InputMissing | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamTransport(_) | AppError::ResponseParse(_) => StatusCode::BAD_GATEWAY,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_error_state(&self) -> ErrorState {
        ErrorState {
            error_message: self.user_message().to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InputMissing => write!(f, "Input missing: no document was uploaded"),
            AppError::UpstreamTransport(msg) => write!(f, "Upstream transport error: {}", msg),
            AppError::ResponseParse(msg) => write!(f, "Response parse error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Maps each variant to a status code and an `{"errorMessage": ...}` body.
    /// Only the generic message leaves the process.
    fn into_response(self) -> Response {
        match &self {
            AppError::Unauthorized(msg) => tracing::warn!("Unauthorized access: {}", msg),
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            _ => {}
        }

        let mut response = (self.status_code(), Json(self.to_error_state())).into_response();
        if matches!(self, AppError::Unauthorized(_)) {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Basic realm=\"invoice-intel\""),
            );
        }
        response
    }
}
