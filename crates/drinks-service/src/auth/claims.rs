//! JWT claims structure.
//!
//! Contains the claims extracted from validated tokens. The `sub` field is
//! redacted in Debug output to prevent exposure in logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Claims structure for validated access tokens.
///
/// The identity provider issues tokens carrying a `permissions` array of
/// granted permission strings (e.g. `post:drinks`). The array is optional at
/// the deserialization layer so that a token missing the claim can be
/// rejected with a claims-shape error rather than a parse error.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer URL.
    pub iss: String,

    /// Subject (user or client identifier) - redacted in Debug output.
    pub sub: String,

    /// Intended audience.
    pub aud: String,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Permission strings granted to this token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

/// Custom Debug implementation that redacts the `sub` field.
///
/// The `sub` field contains user/client identifiers which are sensitive
/// and should not be exposed in logs or debug output.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("iss", &self.iss)
            .field("sub", &"[REDACTED]")
            .field("aud", &self.aud)
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("permissions", &self.permissions)
            .finish()
    }
}

impl Claims {
    /// Check if the token grants a specific permission.
    ///
    /// Returns `false` when the permissions claim is absent; callers that
    /// need to distinguish absent-vs-insufficient use the permission check
    /// in [`crate::auth::permissions`].
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .as_deref()
            .is_some_and(|perms| perms.iter().any(|p| p == permission))
    }
}
