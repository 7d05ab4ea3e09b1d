//! Drinks service configuration.
//!
//! Configuration is loaded from environment variables. Sensitive fields are
//! redacted in Debug output.

use crate::auth::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Drinks service configuration.
///
/// Loaded from environment variables with sensible defaults.
/// Database URL is redacted in Debug output to prevent credential leakage.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Expected token issuer URL (the identity provider).
    pub auth_issuer: String,

    /// Expected token audience.
    pub auth_audience: String,

    /// URL to the issuer's JWKS endpoint for token validation.
    /// Defaults to `{issuer}/.well-known/jwks.json`.
    pub jwks_url: String,

    /// Clock skew tolerance in seconds for issued-at validation.
    pub jwt_clock_skew_seconds: i64,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("auth_issuer", &self.auth_issuer)
            .field("auth_audience", &self.auth_audience)
            .field("jwks_url", &self.jwks_url)
            .field("jwt_clock_skew_seconds", &self.jwt_clock_skew_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let auth_issuer = vars
            .get("AUTH_ISSUER")
            .ok_or_else(|| ConfigError::MissingEnvVar("AUTH_ISSUER".to_string()))?
            .clone();

        let auth_audience = vars
            .get("AUTH_AUDIENCE")
            .ok_or_else(|| ConfigError::MissingEnvVar("AUTH_AUDIENCE".to_string()))?
            .clone();

        let jwks_url = vars.get("AUTH_JWKS_URL").cloned().unwrap_or_else(|| {
            format!(
                "{}/.well-known/jwks.json",
                auth_issuer.trim_end_matches('/')
            )
        });

        // Parse JWT clock skew tolerance with validation
        let jwt_clock_skew_seconds = if let Some(value_str) = vars.get("JWT_CLOCK_SKEW_SECONDS") {
            let value: i64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value <= 0 {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be positive, got {}",
                    value
                )));
            }

            if value > MAX_CLOCK_SKEW.as_secs() as i64 {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                    MAX_CLOCK_SKEW.as_secs(),
                    value
                )));
            }

            value
        } else {
            DEFAULT_CLOCK_SKEW.as_secs() as i64
        };

        Ok(Config {
            database_url,
            bind_address,
            auth_issuer,
            auth_audience,
            jwks_url,
            jwt_clock_skew_seconds,
        })
    }
}
