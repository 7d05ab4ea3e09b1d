//! Token verification for the drinks service.
//!
//! Validates incoming bearer tokens using public keys fetched from the
//! identity provider's JWKS endpoint.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only EdDSA (Ed25519) signatures are accepted
//! - Expiration, audience and issuer claims are validated
//! - Issued-at is validated with clock skew tolerance
//! - Verification failures carry a machine-readable failure code but keep
//!   client-facing messages free of internal detail

use crate::auth::claims::Claims;
use crate::auth::jwks::{Jwk, JwksClient};
use crate::errors::ApiError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Maximum allowed token size in bytes (8KB).
///
/// Tokens larger than this are rejected before any base64 decoding or
/// cryptographic work happens. Typical tokens are 200-500 bytes.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Default clock skew tolerance for issued-at validation (5 minutes).
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Maximum allowed clock skew tolerance (10 minutes).
///
/// Bounds configuration so a misconfigured deployment cannot weaken
/// issued-at validation arbitrarily.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

/// Extract the `kid` (key ID) from a token header without verifying the signature.
///
/// Used to look up the correct signing key when multiple keys may be valid
/// (e.g. during key rotation). The token MUST still be verified after the
/// key is fetched; the `kid` is only trustworthy as a lookup hint.
///
/// # Errors
///
/// Returns a 401 `invalid_header` error when the token is oversized, not a
/// three-part JWT, not base64url, not JSON, or has no string `kid`.
pub fn extract_kid(token: &str) -> Result<String, ApiError> {
    // Check token size first (DoS prevention)
    if token.len() > MAX_TOKEN_SIZE_BYTES {
        tracing::debug!(
            target: "drinks.auth.jwt",
            token_size = token.len(),
            max_size = MAX_TOKEN_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(malformed_token());
    }

    // JWT format: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "drinks.auth.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(malformed_token());
    }

    let header_part = parts.first().ok_or_else(malformed_token)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "drinks.auth.jwt", error = %e, "Failed to decode token header base64");
        malformed_token()
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "drinks.auth.jwt", error = %e, "Failed to parse token header JSON");
        malformed_token()
    })?;

    // Extract kid as string, rejecting empty values
    header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| {
            tracing::debug!(target: "drinks.auth.jwt", "Token header missing kid");
            ApiError::InvalidHeader("Authorization malformed.".to_string())
        })
}

/// Decode an Ed25519 public key from a JWK `x` field (base64url, no padding).
pub fn decode_public_key(x_b64url: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(x_b64url)
}

/// Validate the `iat` (issued-at) claim with clock skew tolerance.
///
/// Rejects tokens issued too far in the future, which indicates either a
/// clock synchronization problem or token manipulation.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), ApiError> {
    let now = chrono::Utc::now().timestamp();
    validate_iat_at(iat, clock_skew, now)
}

/// Deterministic `iat` validation against an explicit `now` timestamp.
///
/// Prefer [`validate_iat`] in production code. This variant exists so that
/// boundary conditions can be unit-tested without wall-clock dependence.
pub(crate) fn validate_iat_at(
    iat: i64,
    clock_skew: Duration,
    now: i64,
) -> Result<(), ApiError> {
    // Safe cast: clock_skew is bounded to MAX_CLOCK_SKEW (600 seconds)
    #[allow(clippy::cast_possible_wrap)]
    let clock_skew_secs = clock_skew.as_secs() as i64;
    let max_iat = now + clock_skew_secs;

    if iat > max_iat {
        tracing::debug!(
            target: "drinks.auth.jwt",
            iat = iat,
            now = now,
            max_allowed = max_iat,
            "Token rejected: iat too far in the future"
        );
        return Err(ApiError::InvalidClaims(
            "Token issue time is in the future.".to_string(),
        ));
    }

    Ok(())
}

fn malformed_token() -> ApiError {
    ApiError::InvalidHeader("Unable to parse authentication token.".to_string())
}

/// Token verifier backed by the issuer's JWKS.
pub struct JwtValidator {
    /// JWKS client for fetching public keys.
    jwks_client: Arc<JwksClient>,

    /// Expected audience claim.
    audience: String,

    /// Expected issuer claim.
    issuer: String,

    /// Clock skew tolerance in seconds for iat validation.
    clock_skew_seconds: i64,
}

impl JwtValidator {
    /// Create a new token verifier.
    pub fn new(
        jwks_client: Arc<JwksClient>,
        audience: String,
        issuer: String,
        clock_skew_seconds: i64,
    ) -> Self {
        Self {
            jwks_client,
            audience,
            issuer,
            clock_skew_seconds,
        }
    }

    /// Validate a bearer token and return the decoded claims.
    ///
    /// # Verification steps
    ///
    /// 1. Size check - reject tokens > 8KB before parsing
    /// 2. Extract kid from the unverified header segment
    /// 3. Fetch the matching public key from JWKS (cached)
    /// 4. Verify EdDSA signature, expiry, audience and issuer
    /// 5. Validate iat with clock skew tolerance
    ///
    /// # Errors
    ///
    /// - `token_expired` (401) for expired tokens
    /// - `invalid_claims` (401) for audience/issuer mismatch or future iat
    /// - `invalid_header` (401) for every other malformed-token condition,
    ///   including an unknown `kid`
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str) -> Result<Claims, ApiError> {
        // 1-2. Extract kid (includes the size check)
        let kid = extract_kid(token)?;

        // 3. Fetch public key from JWKS
        let jwk = self.jwks_client.get_key(&kid).await?;

        // 4. Verify signature and registered claims
        let claims = self.verify_token(token, &jwk)?;

        // 5. Validate iat with clock skew tolerance
        validate_iat(claims.iat, Duration::from_secs(self.clock_skew_seconds.max(0) as u64))?;

        tracing::debug!(target: "drinks.auth.jwt", "Token validated successfully");
        Ok(claims)
    }

    /// Verify the token signature and extract claims.
    ///
    /// Uses EdDSA (Ed25519) exclusively; any other algorithm in the token or
    /// the JWK is rejected before signature verification.
    fn verify_token(&self, token: &str, jwk: &Jwk) -> Result<Claims, ApiError> {
        // Validate the JWK is an EdDSA key
        if jwk.kty != "OKP" {
            tracing::warn!(target: "drinks.auth.jwt", kty = %jwk.kty, "Unexpected JWK key type");
            return Err(malformed_token());
        }
        if let Some(alg) = &jwk.alg {
            if alg != "EdDSA" {
                tracing::warn!(target: "drinks.auth.jwt", alg = %alg, "Unexpected JWK algorithm");
                return Err(malformed_token());
            }
        }

        // Get public key bytes from the JWK
        let public_key_b64 = jwk.x.as_ref().ok_or_else(|| {
            tracing::error!(target: "drinks.auth.jwt", kid = %jwk.kid, "JWK missing x field");
            malformed_token()
        })?;

        let public_key_bytes = decode_public_key(public_key_b64).map_err(|e| {
            tracing::error!(target: "drinks.auth.jwt", error = %e, "Invalid public key encoding");
            malformed_token()
        })?;

        let decoding_key = DecodingKey::from_ed_der(&public_key_bytes);

        // Configure validation: signature, expiry, audience and issuer
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.validate_exp = true;
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_issuer(&[self.issuer.as_str()]);

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            tracing::debug!(target: "drinks.auth.jwt", error = %e, "Token verification failed");
            match e.kind() {
                ErrorKind::ExpiredSignature => ApiError::TokenExpired,
                ErrorKind::InvalidAudience | ErrorKind::InvalidIssuer => ApiError::InvalidClaims(
                    "Incorrect claims. Please, check the audience and issuer.".to_string(),
                ),
                _ => malformed_token(),
            }
        })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn test_validator(jwk_url: &str) -> JwtValidator {
        JwtValidator::new(
            Arc::new(JwksClient::new(jwk_url.to_string())),
            "drinks".to_string(),
            "https://issuer.example.com/".to_string(),
            300,
        )
    }

    fn fake_token(header: &str) -> String {
        let header_b64 = URL_SAFE_NO_PAD.encode(header.as_bytes());
        let payload = r#"{"iss":"https://issuer.example.com/","sub":"u","aud":"drinks","exp":9999999999,"iat":1234567890}"#;
        let payload_b64 = URL_SAFE_NO_PAD.encode(payload.as_bytes());
        format!("{}.{}.fake_signature", header_b64, payload_b64)
    }

    // -------------------------------------------------------------------------
    // extract_kid
    // -------------------------------------------------------------------------

    #[test]
    fn test_extract_kid_valid_token() {
        let header = r#"{"alg":"EdDSA","typ":"JWT","kid":"signing-key-01"}"#;
        let token = fake_token(header);

        let kid = extract_kid(&token);
        assert_eq!(kid.unwrap(), "signing-key-01".to_string());
    }

    #[test]
    fn test_extract_kid_missing_kid() {
        let header = r#"{"alg":"EdDSA","typ":"JWT"}"#;
        let token = fake_token(header);

        let result = extract_kid(&token);
        assert!(matches!(result, Err(ApiError::InvalidHeader(_))));
    }

    #[test]
    fn test_extract_kid_malformed_token() {
        // Wrong number of parts
        assert!(extract_kid("not.a.valid.jwt.format").is_err());
        assert!(extract_kid("only.two").is_err());
        assert!(extract_kid("single").is_err());
        assert!(extract_kid("").is_err());
    }

    #[test]
    fn test_extract_kid_invalid_base64() {
        let token = "!!!invalid!!!.payload.signature";
        assert!(extract_kid(token).is_err());
    }

    #[test]
    fn test_extract_kid_invalid_json() {
        let header_b64 = URL_SAFE_NO_PAD.encode("not valid json".as_bytes());
        let token = format!("{}.payload.signature", header_b64);
        assert!(extract_kid(&token).is_err());
    }

    #[test]
    fn test_extract_kid_non_string_kid() {
        let header = r#"{"alg":"EdDSA","typ":"JWT","kid":12345}"#;
        let token = fake_token(header);
        assert!(extract_kid(&token).is_err());
    }

    #[test]
    fn test_extract_kid_empty_string_kid() {
        let header = r#"{"alg":"EdDSA","typ":"JWT","kid":""}"#;
        let token = fake_token(header);
        assert!(extract_kid(&token).is_err(), "Empty kid should be rejected");
    }

    #[test]
    fn test_extract_kid_oversized_token() {
        let oversized = "a".repeat(MAX_TOKEN_SIZE_BYTES + 1);
        let result = extract_kid(&oversized);
        assert!(matches!(result, Err(ApiError::InvalidHeader(_))));
    }

    #[test]
    fn test_extract_kid_at_size_limit() {
        let header = r#"{"alg":"EdDSA","typ":"JWT","kid":"key"}"#;
        let header_b64 = URL_SAFE_NO_PAD.encode(header);
        // Need 3 parts: header.payload.signature (2 dots)
        let remaining = MAX_TOKEN_SIZE_BYTES - header_b64.len() - 2;
        let payload_len = remaining / 2;
        let sig_len = remaining - payload_len;
        let token = format!(
            "{}.{}.{}",
            header_b64,
            "a".repeat(payload_len),
            "b".repeat(sig_len)
        );

        assert_eq!(token.len(), MAX_TOKEN_SIZE_BYTES);

        let result = extract_kid(&token);
        assert!(result.is_ok(), "Token at size limit should be accepted");
        assert_eq!(result.unwrap(), "key");
    }

    // -------------------------------------------------------------------------
    // validate_iat
    // -------------------------------------------------------------------------

    #[test]
    fn test_validate_iat_current_time() {
        let now = chrono::Utc::now().timestamp();
        assert!(validate_iat(now, DEFAULT_CLOCK_SKEW).is_ok());
    }

    #[test]
    fn test_validate_iat_past_time() {
        let past = chrono::Utc::now().timestamp() - 3600;
        assert!(validate_iat(past, DEFAULT_CLOCK_SKEW).is_ok());
    }

    #[test]
    fn test_validate_iat_beyond_clock_skew() {
        let now = chrono::Utc::now().timestamp();
        #[allow(clippy::cast_possible_wrap)]
        let future = now + DEFAULT_CLOCK_SKEW.as_secs() as i64 + 10;
        let result = validate_iat(future, DEFAULT_CLOCK_SKEW);
        assert!(matches!(result, Err(ApiError::InvalidClaims(_))));
    }

    #[test]
    fn test_validate_iat_at_boundary_exact() {
        let now = 1_700_000_000_i64;

        // iat == now + skew is the last accepted value
        assert!(validate_iat_at(now + 300, DEFAULT_CLOCK_SKEW, now).is_ok());

        // iat == now + skew + 1 is the first rejected value
        assert!(matches!(
            validate_iat_at(now + 301, DEFAULT_CLOCK_SKEW, now),
            Err(ApiError::InvalidClaims(_))
        ));
    }

    // -------------------------------------------------------------------------
    // verify_token JWK validation
    // -------------------------------------------------------------------------

    fn jwk(kty: &str, alg: Option<&str>, x: Option<&str>) -> Jwk {
        Jwk {
            kty: kty.to_string(),
            kid: "signing-key-01".to_string(),
            crv: Some("Ed25519".to_string()),
            x: x.map(ToString::to_string),
            alg: alg.map(ToString::to_string),
            key_use: Some("sig".to_string()),
        }
    }

    #[test]
    fn test_verify_token_rejects_non_okp_key_type() {
        let validator = test_validator("http://127.0.0.1:1/jwks.json");
        let jwk = jwk("RSA", Some("EdDSA"), Some("dGVzdC1wdWJsaWMta2V5"));
        let token = fake_token(r#"{"alg":"EdDSA","typ":"JWT","kid":"signing-key-01"}"#);

        let result = validator.verify_token(&token, &jwk);
        assert!(matches!(result, Err(ApiError::InvalidHeader(_))));
    }

    #[test]
    fn test_verify_token_rejects_non_eddsa_algorithm() {
        let validator = test_validator("http://127.0.0.1:1/jwks.json");
        let jwk = jwk("OKP", Some("RS256"), Some("dGVzdC1wdWJsaWMta2V5"));
        let token = fake_token(r#"{"alg":"EdDSA","typ":"JWT","kid":"signing-key-01"}"#);

        let result = validator.verify_token(&token, &jwk);
        assert!(matches!(result, Err(ApiError::InvalidHeader(_))));
    }

    #[test]
    fn test_verify_token_rejects_missing_x_field() {
        let validator = test_validator("http://127.0.0.1:1/jwks.json");
        let jwk = jwk("OKP", Some("EdDSA"), None);
        let token = fake_token(r#"{"alg":"EdDSA","typ":"JWT","kid":"signing-key-01"}"#);

        let result = validator.verify_token(&token, &jwk);
        assert!(matches!(result, Err(ApiError::InvalidHeader(_))));
    }

    #[test]
    fn test_verify_token_rejects_invalid_base64_public_key() {
        let validator = test_validator("http://127.0.0.1:1/jwks.json");
        let jwk = jwk("OKP", Some("EdDSA"), Some("!!!invalid-base64!!!"));
        let token = fake_token(r#"{"alg":"EdDSA","typ":"JWT","kid":"signing-key-01"}"#);

        let result = validator.verify_token(&token, &jwk);
        assert!(matches!(result, Err(ApiError::InvalidHeader(_))));
    }

    #[test]
    fn test_verify_token_rejects_forged_signature() {
        let validator = test_validator("http://127.0.0.1:1/jwks.json");
        // Valid base64 but not the key that signed the token
        let jwk = jwk("OKP", Some("EdDSA"), Some("dGVzdC1wdWJsaWMta2V5"));
        let token = fake_token(r#"{"alg":"EdDSA","typ":"JWT","kid":"signing-key-01"}"#);

        let result = validator.verify_token(&token, &jwk);
        assert!(matches!(result, Err(ApiError::InvalidHeader(_))));
    }

    #[test]
    fn test_decode_public_key() {
        let x = "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo";
        let result = decode_public_key(x);
        assert!(result.is_ok());
        assert_eq!(result.unwrap().len(), 32); // Ed25519 public key is 32 bytes
    }

    #[test]
    fn test_decode_public_key_invalid() {
        assert!(decode_public_key("not-valid-base64url!!!").is_err());
    }
}
