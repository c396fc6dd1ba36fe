//! HTTP-facing error taxonomy
//!
//! Every failure of `POST /oriento/ask` ends up as one of these variants.
//! Diagnostic detail stays in the variant (and in the logs); the response
//! body only carries a stable code and a caller-safe message.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::AuthRejection;
use crate::client::UpstreamError;

/// Generic message returned for upstream failures
pub const UPSTREAM_FAILURE_MESSAGE: &str = "The assistant could not produce an answer";

/// Errors surfaced by the ask operation
#[derive(Debug, Error)]
pub enum ApiError {
    /// Credential missing, malformed or rejected
    #[error("Unauthenticated: {0}")]
    Unauthenticated(#[from] AuthRejection),

    /// Structurally invalid call (missing parameter, bad body encoding)
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Body larger than the configured limit
    #[error("Request body too large")]
    PayloadTooLarge,

    /// The answering collaborator failed
    #[error("Upstream failure: {0}")]
    UpstreamFailure(#[from] UpstreamError),
}

impl ApiError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        ApiError::MalformedRequest(msg.into())
    }

    /// Error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::MalformedRequest(_) => "MALFORMED_REQUEST",
            ApiError::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ApiError::UpstreamFailure(_) => "UPSTREAM_FAILURE",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UpstreamFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message that is safe to show to the caller
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Unauthenticated(_) => "A valid bearer token is required".to_string(),
            ApiError::MalformedRequest(msg) => msg.clone(),
            ApiError::PayloadTooLarge => "Request body too large".to_string(),
            ApiError::UpstreamFailure(_) => UPSTREAM_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        ErrorInfo::new(self.error_code(), self.public_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (status, Json(self.to_error_info())).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

/// Error body for API responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for the ask operation
pub type Result<T> = std::result::Result<T, ApiError>;
