//! Top-level error envelope boundary.
//!
//! Outermost middleware that guarantees every error response leaves the
//! service in the wire envelope `{"success": false, "error": <status>,
//! "message": <string>}`. Handler errors already produce the envelope via
//! `ApiError`; this layer catches everything generated by the framework
//! itself - unknown routes (404), wrong methods (405), extractor rejections
//! (400/415/422), timeouts and any unmapped 500.

use crate::errors::ErrorEnvelope;
use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

/// Normalize framework-generated error responses into the wire envelope.
///
/// Responses that are not errors, or that already carry a JSON body (i.e.
/// came from `ApiError::into_response`), pass through untouched.
pub async fn envelope_errors(req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let already_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    if already_json {
        return response;
    }

    tracing::debug!(
        target: "drinks.middleware.envelope",
        status = status.as_u16(),
        "Normalizing framework error response into envelope"
    );

    (status, Json(ErrorEnvelope::for_status(status, message_for(status)))).into_response()
}

/// Canonical client-facing message for a framework-generated status.
fn message_for(status: StatusCode) -> String {
    match status {
        StatusCode::NOT_FOUND => "Not Found".to_string(),
        StatusCode::METHOD_NOT_ALLOWED => "Method Not Allowed".to_string(),
        StatusCode::UNPROCESSABLE_ENTITY => "Unprocessable".to_string(),
        StatusCode::BAD_REQUEST => "Bad Request".to_string(),
        StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error".to_string(),
        other => other
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    }
}
