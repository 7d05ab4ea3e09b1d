//! Health check handler.

use tracing::instrument;

/// Handler for GET /health.
///
/// Liveness probe: returns plain "OK" without touching any collaborator.
#[instrument(name = "drinks.handlers.health")]
pub async fn health_check() -> &'static str {
    "OK"
}
