//! JWKS client for fetching and caching the issuer's public signing keys.
//!
//! The JWKS (JSON Web Key Set) client fetches public keys from the identity
//! provider's `/.well-known/jwks.json` endpoint and caches them with a
//! configurable TTL.
//!
//! # Security
//!
//! - Keys are cached to reduce load on the issuer and improve latency
//! - Cache is invalidated on TTL expiry to pick up key rotations
//! - The fetch has a bounded timeout and fails closed: an unreachable or
//!   malformed JWKS endpoint rejects the request, it never lets a token pass
//! - Concurrent refreshes are idempotent; a duplicate fetch only overwrites
//!   the cache with an equally fresh copy

use crate::errors::ApiError;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::instrument;

/// Default cache TTL in seconds (5 minutes).
const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

/// Timeout for JWKS fetches in seconds.
const FETCH_TIMEOUT_SECONDS: u64 = 10;

/// JSON Web Key from the JWKS endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type (always "OKP" for Ed25519).
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    pub kid: String,

    /// Curve name (always "Ed25519" for EdDSA).
    #[serde(default)]
    pub crv: Option<String>,

    /// Public key value (base64url encoded).
    #[serde(default)]
    pub x: Option<String>,

    /// Algorithm (should be "EdDSA").
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
}

/// JWKS response from the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    /// List of JSON Web Keys.
    pub keys: Vec<Jwk>,
}

/// Cached JWKS data with expiry time.
struct CachedJwks {
    /// Map of key ID to JWK.
    keys: HashMap<String, Jwk>,

    /// When this cache entry expires.
    expires_at: Instant,
}

/// JWKS client for fetching and caching public keys.
///
/// Thread-safe client that fetches the key set from the identity provider
/// and caches the keys with a configurable TTL.
pub struct JwksClient {
    /// URL to the JWKS endpoint.
    jwks_url: String,

    /// HTTP client for fetching JWKS.
    http_client: reqwest::Client,

    /// Cached JWKS data.
    cache: Arc<RwLock<Option<CachedJwks>>>,

    /// Cache TTL duration.
    cache_ttl: Duration,
}

impl JwksClient {
    /// Create a new JWKS client with the default cache TTL.
    pub fn new(jwks_url: String) -> Self {
        Self::with_ttl(jwks_url, Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS))
    }

    /// Create a new JWKS client with custom cache TTL.
    pub fn with_ttl(jwks_url: String, cache_ttl: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECONDS))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "drinks.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            cache: Arc::new(RwLock::new(None)),
            cache_ttl,
        }
    }

    /// Get a JWK by key ID.
    ///
    /// Returns the JWK if found, or fetches from the issuer if the cache is
    /// expired or empty.
    ///
    /// # Errors
    ///
    /// Returns a 401 `ApiError` when the key set cannot be fetched or the
    /// key ID is not present in it. Both cases reject the request: there is
    /// no path on which verification silently passes.
    #[instrument(skip(self), fields(kid = %kid))]
    pub async fn get_key(&self, kid: &str) -> Result<Jwk, ApiError> {
        // Check cache first
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Instant::now() {
                    if let Some(key) = cached.keys.get(kid) {
                        tracing::debug!(target: "drinks.auth.jwks", kid = %kid, "JWKS cache hit");
                        return Ok(key.clone());
                    }
                    // Key not found in valid cache
                    tracing::debug!(target: "drinks.auth.jwks", kid = %kid, "Key not found in JWKS cache");
                    return Err(ApiError::InvalidHeader(
                        "Unable to find the appropriate key.".to_string(),
                    ));
                }
            }
        }

        // Cache miss or expired - fetch fresh JWKS
        self.refresh_cache().await?;

        // Try to get key from refreshed cache
        let cache = self.cache.read().await;
        if let Some(cached) = cache.as_ref() {
            if let Some(key) = cached.keys.get(kid) {
                return Ok(key.clone());
            }
        }

        // Key not found even after refresh
        tracing::warn!(target: "drinks.auth.jwks", kid = %kid, "Key not found in JWKS after refresh");
        Err(ApiError::InvalidHeader(
            "Unable to find the appropriate key.".to_string(),
        ))
    }

    /// Refresh the JWKS cache by fetching from the identity provider.
    #[instrument(skip(self))]
    async fn refresh_cache(&self) -> Result<(), ApiError> {
        tracing::debug!(target: "drinks.auth.jwks", url = %self.jwks_url, "Fetching JWKS from issuer");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "drinks.auth.jwks", error = %e, "Failed to fetch JWKS");
                ApiError::InvalidHeader("Unable to verify credentials.".to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "drinks.auth.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            return Err(ApiError::InvalidHeader(
                "Unable to verify credentials.".to_string(),
            ));
        }

        let jwks: JwksResponse = response.json().await.map_err(|e| {
            tracing::error!(target: "drinks.auth.jwks", error = %e, "Failed to parse JWKS response");
            ApiError::InvalidHeader("Unable to verify credentials.".to_string())
        })?;

        // Build key map
        let keys: HashMap<String, Jwk> = jwks
            .keys
            .into_iter()
            .map(|key| (key.kid.clone(), key))
            .collect();

        tracing::info!(
            target: "drinks.auth.jwks",
            key_count = keys.len(),
            "JWKS cache refreshed"
        );

        // Update cache
        let mut cache = self.cache.write().await;
        *cache = Some(CachedJwks {
            keys,
            expires_at: Instant::now() + self.cache_ttl,
        });

        Ok(())
    }
}
