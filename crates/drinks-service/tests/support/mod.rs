//! Shared integration-test harness.
//!
//! Spawns the service on an ephemeral port against a mocked JWKS endpoint
//! and an in-memory repository, and mints Ed25519-signed test tokens.

use anyhow::Result;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use drinks_service::config::Config;
use drinks_service::repositories::drinks::mock::InMemoryDrinks;
use drinks_service::repositories::DrinkRepository;
use drinks_service::routes::{self, AppState};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ring::signature::{Ed25519KeyPair, KeyPair};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Issuer baked into test configuration and tokens.
pub const TEST_ISSUER: &str = "https://auth.drinks.test/";

/// Audience baked into test configuration and tokens.
pub const TEST_AUDIENCE: &str = "drinks";

/// JWT claims for test tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

impl TestClaims {
    /// Claims for a currently-valid token with the given permissions.
    pub fn valid(permissions: &[&str]) -> Self {
        let now = Utc::now().timestamp();
        Self {
            iss: TEST_ISSUER.to_string(),
            sub: "auth0|integration-test".to_string(),
            aud: TEST_AUDIENCE.to_string(),
            exp: now + 3600,
            iat: now,
            permissions: Some(permissions.iter().map(ToString::to_string).collect()),
        }
    }
}

/// Test keypair for signing tokens.
pub struct TestKeypair {
    pub kid: String,
    public_key_bytes: Vec<u8>,
    private_key_pkcs8: Vec<u8>,
}

impl TestKeypair {
    pub fn new(seed: u8, kid: &str) -> Self {
        // Create deterministic seed
        let mut seed_bytes = [0u8; 32];
        seed_bytes[0] = seed;
        for (i, byte) in seed_bytes.iter_mut().enumerate().skip(1) {
            *byte = seed.wrapping_mul(i as u8).wrapping_add(i as u8);
        }

        let key_pair = Ed25519KeyPair::from_seed_unchecked(&seed_bytes)
            .expect("Failed to create test keypair");

        let public_key_bytes = key_pair.public_key().as_ref().to_vec();
        let private_key_pkcs8 = build_pkcs8_from_seed(&seed_bytes);

        Self {
            kid: kid.to_string(),
            public_key_bytes,
            private_key_pkcs8,
        }
    }

    pub fn sign_token(&self, claims: &TestClaims) -> String {
        let encoding_key = EncodingKey::from_ed_der(&self.private_key_pkcs8);
        let mut header = Header::new(Algorithm::EdDSA);
        header.typ = Some("JWT".to_string());
        header.kid = Some(self.kid.clone());

        encode(&header, claims, &encoding_key).expect("Failed to sign token")
    }

    pub fn jwk_json(&self) -> serde_json::Value {
        serde_json::json!({
            "kty": "OKP",
            "kid": self.kid,
            "crv": "Ed25519",
            "x": URL_SAFE_NO_PAD.encode(&self.public_key_bytes),
            "alg": "EdDSA",
            "use": "sig"
        })
    }
}

/// Build PKCS#8 v1 document from an Ed25519 seed.
fn build_pkcs8_from_seed(seed: &[u8; 32]) -> Vec<u8> {
    let mut pkcs8 = Vec::new();

    // Outer SEQUENCE tag
    pkcs8.push(0x30);
    pkcs8.push(0x2e); // Length: 46 bytes

    // Version: INTEGER 0
    pkcs8.extend_from_slice(&[0x02, 0x01, 0x00]);

    // Algorithm Identifier: SEQUENCE
    pkcs8.push(0x30);
    pkcs8.push(0x05); // Length: 5 bytes
                      // OID for Ed25519: 1.3.101.112
    pkcs8.extend_from_slice(&[0x06, 0x03, 0x2b, 0x65, 0x70]);

    // Private Key: OCTET STRING
    pkcs8.push(0x04);
    pkcs8.push(0x22); // Length: 34 bytes
                      // Inner OCTET STRING with seed
    pkcs8.push(0x04);
    pkcs8.push(0x20); // Length: 32 bytes
    pkcs8.extend_from_slice(seed);

    pkcs8
}

/// Test server with a mocked JWKS endpoint and an in-memory repository.
pub struct TestServer {
    pub addr: SocketAddr,
    pub mock_jwks: MockServer,
    pub keypair: TestKeypair,
    pub repo: Arc<InMemoryDrinks>,
    server_handle: JoinHandle<()>,
}

impl TestServer {
    /// Spawn the service with the given repository double.
    pub async fn spawn(repo: InMemoryDrinks) -> Result<Self> {
        // Create mock JWKS server
        let mock_jwks = MockServer::start().await;
        let keypair = TestKeypair::new(1, "test-key-01");

        // Set up JWKS endpoint
        let jwks_response = serde_json::json!({
            "keys": [keypair.jwk_json()]
        });

        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&jwks_response))
            .mount(&mock_jwks)
            .await;

        Self::spawn_inner(repo, mock_jwks, keypair).await
    }

    /// Spawn the service with a broken JWKS endpoint (always 500).
    pub async fn spawn_with_broken_jwks(repo: InMemoryDrinks) -> Result<Self> {
        let mock_jwks = MockServer::start().await;
        let keypair = TestKeypair::new(1, "test-key-01");

        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_jwks)
            .await;

        Self::spawn_inner(repo, mock_jwks, keypair).await
    }

    async fn spawn_inner(
        repo: InMemoryDrinks,
        mock_jwks: MockServer,
        keypair: TestKeypair,
    ) -> Result<Self> {
        // Build configuration pointing to the mock JWKS server. The
        // database URL is never dialed: the repository double is injected
        // directly into the application state.
        let jwks_url = format!("{}/.well-known/jwks.json", mock_jwks.uri());

        let vars = HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "postgresql://test/test".to_string(),
            ),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("AUTH_ISSUER".to_string(), TEST_ISSUER.to_string()),
            ("AUTH_AUDIENCE".to_string(), TEST_AUDIENCE.to_string()),
            ("AUTH_JWKS_URL".to_string(), jwks_url),
        ]);

        let config =
            Config::from_vars(&vars).map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let repo = Arc::new(repo);

        let state = Arc::new(AppState {
            repo: repo.clone() as Arc<dyn DrinkRepository>,
            config,
        });

        let app = routes::build_routes(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        // Spawn server in background
        let server_handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            mock_jwks,
            keypair,
            repo,
            server_handle,
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A currently-valid token carrying the given permissions.
    pub fn token_with_permissions(&self, permissions: &[&str]) -> String {
        self.keypair.sign_token(&TestClaims::valid(permissions))
    }

    /// A syntactically valid token with no permissions claim at all.
    pub fn token_without_permissions_claim(&self) -> String {
        let mut claims = TestClaims::valid(&[]);
        claims.permissions = None;
        self.keypair.sign_token(&claims)
    }

    /// A token that expired an hour ago.
    pub fn expired_token(&self, permissions: &[&str]) -> String {
        let mut claims = TestClaims::valid(permissions);
        let now = Utc::now().timestamp();
        claims.exp = now - 3600;
        claims.iat = now - 7200;
        self.keypair.sign_token(&claims)
    }

    /// A token whose audience does not match the service configuration.
    pub fn wrong_audience_token(&self, permissions: &[&str]) -> String {
        let mut claims = TestClaims::valid(permissions);
        claims.aud = "some-other-api".to_string();
        self.keypair.sign_token(&claims)
    }

    /// A token whose issuer does not match the service configuration.
    pub fn wrong_issuer_token(&self, permissions: &[&str]) -> String {
        let mut claims = TestClaims::valid(permissions);
        claims.iss = "https://rogue.issuer.test/".to_string();
        self.keypair.sign_token(&claims)
    }

    /// A token issued an hour in the future.
    pub fn future_iat_token(&self, permissions: &[&str]) -> String {
        let mut claims = TestClaims::valid(permissions);
        let now = Utc::now().timestamp();
        claims.exp = now + 7200;
        claims.iat = now + 3600;
        self.keypair.sign_token(&claims)
    }

    /// Replace the published JWKS with a different key so tokens signed by
    /// the original keypair no longer match any published key ID.
    pub async fn rotate_jwks_to_unknown_key(&self) {
        let different_keypair = TestKeypair::new(2, "different-key");
        let jwks_response = serde_json::json!({
            "keys": [different_keypair.jwk_json()]
        });

        self.mock_jwks.reset().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&jwks_response))
            .mount(&self.mock_jwks)
            .await;
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

/// Assert the standard failure envelope and return its message.
pub fn assert_error_envelope(body: &serde_json::Value, status: u16) -> String {
    assert_eq!(body["success"], false, "envelope success flag: {body}");
    assert_eq!(body["error"], status, "envelope error code: {body}");
    assert!(body["message"].is_string(), "envelope message: {body}");
    body["message"].as_str().unwrap_or_default().to_string()
}
