//! Permission checks against verified claims.
//!
//! Runs after token verification: the claims are already authentic, the only
//! question is whether they grant what the endpoint requires.

use crate::auth::claims::Claims;
use crate::errors::ApiError;

/// Check that verified claims grant a required permission.
///
/// # Errors
///
/// - `invalid_claims` (400) when the permissions collection is absent from
///   the claims - the token is mis-shaped, which is a client problem, not an
///   authorization decision
/// - `unauthorized` (403) when the collection is present but does not
///   contain the required permission
pub fn check_permission(claims: &Claims, required: &str) -> Result<(), ApiError> {
    let permissions = claims
        .permissions
        .as_deref()
        .ok_or(ApiError::MissingPermissions)?;

    if !permissions.iter().any(|p| p == required) {
        tracing::debug!(
            target: "drinks.auth.permissions",
            required = %required,
            "Token lacks required permission"
        );
        return Err(ApiError::Forbidden("Permission not found.".to_string()));
    }

    Ok(())
}
