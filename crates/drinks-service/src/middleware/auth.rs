//! Authorization guard for protected routes.
//!
//! One reusable middleware enforces "permission X is required here" for
//! every protected endpoint: it extracts the bearer token from the
//! Authorization header, verifies it against the issuer's JWKS, checks the
//! configured required permission, and injects the verified claims into
//! request extensions for the handler. Any failure short-circuits the
//! handler entirely.

use crate::auth::{check_permission, Claims, JwtValidator};
use crate::errors::ApiError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authorization guard: the verifier plus the permission this
/// route group requires.
#[derive(Clone)]
pub struct PermissionGuard {
    /// Token verifier with JWKS client.
    pub jwt_validator: Arc<JwtValidator>,

    /// Permission string required by the guarded endpoint.
    pub required_permission: &'static str,
}

impl PermissionGuard {
    /// Create a guard requiring the given permission.
    pub fn new(jwt_validator: Arc<JwtValidator>, required_permission: &'static str) -> Self {
        Self {
            jwt_validator,
            required_permission,
        }
    }
}

/// Extract the bearer token from the Authorization header.
///
/// The header must be exactly `Bearer <token>`: a missing header, a
/// different scheme, a bare scheme with no token, or trailing parts are all
/// rejected as header-shape failures.
fn extract_bearer_token(req: &Request) -> Result<&str, ApiError> {
    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "drinks.middleware.auth", "Missing Authorization header");
            ApiError::InvalidHeader("Authorization header is expected.".to_string())
        })?;

    let mut parts = auth_header.split_whitespace();

    let scheme = parts.next().unwrap_or_default();
    if !scheme.eq_ignore_ascii_case("bearer") {
        tracing::debug!(target: "drinks.middleware.auth", "Authorization header has wrong scheme");
        return Err(ApiError::InvalidHeader(
            "Authorization header must start with \"Bearer\".".to_string(),
        ));
    }

    let token = parts.next().ok_or_else(|| {
        tracing::debug!(target: "drinks.middleware.auth", "Authorization header has no token");
        ApiError::InvalidHeader("Token not found.".to_string())
    })?;

    if parts.next().is_some() {
        tracing::debug!(target: "drinks.middleware.auth", "Authorization header has extra parts");
        return Err(ApiError::InvalidHeader(
            "Authorization header must be a bearer token.".to_string(),
        ));
    }

    Ok(token)
}

/// Authorization middleware for protected endpoints.
///
/// # Response
///
/// - 401 when the header is malformed or the token fails verification
/// - 400 when the verified token carries no permissions claim
/// - 403 when the token lacks the required permission
/// - Continues to the handler with `Claims` in extensions otherwise
#[instrument(skip_all, name = "drinks.middleware.auth")]
pub async fn require_permission(
    State(state): State<PermissionGuard>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let token = extract_bearer_token(&req)?;

    // Verify signature and registered claims
    let claims = state.jwt_validator.validate(token).await?;

    // Check the endpoint's required permission
    check_permission(&claims, state.required_permission)?;

    // Store claims in request extensions for downstream handlers
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Extension trait for extracting claims from a request.
#[allow(dead_code)] // API for handlers that need claims from request
pub trait ClaimsExt {
    /// Get the authenticated claims from request extensions.
    ///
    /// Returns `None` if the guard was not applied to this request.
    fn claims(&self) -> Option<&Claims>;
}

#[allow(dead_code)] // Implementation for ClaimsExt trait
impl<B> ClaimsExt for axum::extract::Request<B> {
    fn claims(&self) -> Option<&Claims> {
        self.extensions().get::<Claims>()
    }
}
