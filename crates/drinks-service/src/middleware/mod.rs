//! Middleware for the drinks service.
//!
//! # Components
//!
//! - `auth` - authorization guard for protected routes
//! - `error_envelope` - outermost layer normalizing framework errors into
//!   the wire envelope

pub mod auth;
pub mod error_envelope;

pub use auth::{require_permission, PermissionGuard};
pub use error_envelope::envelope_errors;
