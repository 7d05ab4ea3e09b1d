//! Drinks Service Library
//!
//! A small HTTP API managing a drinks menu with two visibility tiers:
//! a public summary listing and permission-gated detail plus full CRUD.
//! Access tokens issued by an external identity provider are verified
//! against its published JWKS; each protected endpoint declares the
//! permission it requires.
//!
//! # Architecture
//!
//! The service follows the Handler -> Repository pattern with a
//! middleware-based authorization guard:
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs -> handlers/*.rs -> repositories/*.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - token verification (JWKS, signature, claims, permissions)
//! - `config` - service configuration from environment
//! - `errors` - error taxonomy with wire-envelope mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - authorization guard and envelope boundary
//! - `models` - drink entity, serializations and DTOs
//! - `repositories` - persistence capability and implementations
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
