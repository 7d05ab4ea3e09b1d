//! Authentication for the drinks service.
//!
//! Handles bearer token verification against the identity provider's JWKS
//! endpoint and permission checks on the verified claims.
//!
//! # Components
//!
//! - `jwks` - JWKS client for fetching and caching the issuer's public keys
//! - `jwt` - token verification using cached JWKS keys
//! - `claims` - claims structure for validated tokens
//! - `permissions` - required-permission checks on verified claims

pub mod claims;
pub mod jwks;
pub mod jwt;
pub mod permissions;

pub use claims::Claims;
pub use jwks::JwksClient;
pub use jwt::JwtValidator;
pub use permissions::check_permission;
