//! Drinks service error types.
//!
//! All errors map to an HTTP status code and the wire envelope
//! `{"success": false, "error": <status>, "message": <string>}` via the
//! `IntoResponse` impl. Storage errors are logged server-side and returned
//! to clients with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Drinks service error type.
///
/// Authorization failures carry the stage they were raised at:
/// - `InvalidHeader`, `TokenExpired`, `InvalidClaims`: 401 (token verification)
/// - `MissingPermissions`: 400 (token is valid but its claims are mis-shaped)
/// - `Forbidden`: 403 (token is valid but lacks the required permission)
///
/// Handler-local failures use `NotFound` (404), `BadRequest` (400) and
/// `Unprocessable` (422). Anything else falls back to 500.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid authorization header: {0}")]
    InvalidHeader(String),

    #[error("token expired")]
    TokenExpired,

    #[error("invalid claims: {0}")]
    InvalidClaims(String),

    #[error("permissions claim missing")]
    MissingPermissions,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unprocessable: {0}")]
    Unprocessable(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidHeader(_) | ApiError::TokenExpired | ApiError::InvalidClaims(_) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::MissingPermissions | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Database(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable failure code, used in logs and test assertions.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidHeader(_) => "invalid_header",
            ApiError::TokenExpired => "token_expired",
            ApiError::InvalidClaims(_) | ApiError::MissingPermissions => "invalid_claims",
            ApiError::Forbidden(_) => "unauthorized",
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unprocessable(_) => "unprocessable",
            ApiError::Database(_) | ApiError::Internal => "internal_server_error",
        }
    }
}

/// Wire envelope for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: u16,
    pub message: String,
}

impl ErrorEnvelope {
    /// Build the envelope for an arbitrary status code with the given message.
    pub fn for_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: status.as_u16(),
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            ApiError::InvalidHeader(reason) => reason.clone(),
            ApiError::TokenExpired => "Token expired.".to_string(),
            ApiError::InvalidClaims(reason) => reason.clone(),
            ApiError::MissingPermissions => "Permissions not included in token.".to_string(),
            ApiError::Forbidden(reason) => reason.clone(),
            ApiError::NotFound(resource) => format!("{resource} not found."),
            ApiError::BadRequest(reason) => reason.clone(),
            ApiError::Unprocessable(reason) => reason.clone(),
            ApiError::Database(err) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "drinks.database", error = %err, "Database operation failed");
                "An internal database error occurred".to_string()
            }
            ApiError::Internal => "An internal error occurred".to_string(),
        };

        tracing::debug!(
            target: "drinks.errors",
            code = self.code(),
            status = status.as_u16(),
            "Request failed"
        );

        let mut response =
            (status, Json(ErrorEnvelope::for_status(status, message))).into_response();

        // Add WWW-Authenticate header for 401 responses
        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) = "Bearer realm=\"drinks-api\", error=\"invalid_token\"".parse()
            {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}

/// Convert sqlx errors to ApiError.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Database(err.to_string())
    }
}
