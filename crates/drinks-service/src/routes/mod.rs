//! HTTP routes for the drinks service.
//!
//! Defines the Axum router and application state. Each protected route is
//! wrapped by the authorization guard parameterized with the permission the
//! endpoint requires; the public listing and the health probe carry no guard.

use crate::auth::{JwksClient, JwtValidator};
use crate::config::Config;
use crate::handlers;
use crate::handlers::drinks::{
    CREATE_PERMISSION, DELETE_PERMISSION, LIST_DETAIL_PERMISSION, UPDATE_PERMISSION,
};
use crate::middleware::{envelope_errors, require_permission, PermissionGuard};
use crate::repositories::DrinkRepository;
use axum::{
    handler::Handler,
    http::{header, Method},
    middleware,
    routing::{get, patch},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Drink repository handle.
    pub repo: Arc<dyn DrinkRepository>,

    /// Service configuration.
    pub config: Config,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `GET /health` - liveness probe (public, plain "OK")
/// - `GET /drinks` - public short listing
/// - `GET /drinks-detail` - full listing, requires `get:drinks-detail`
/// - `POST /drinks` - create, requires `post:drinks`
/// - `PATCH /drinks/{id}` - partial update, requires `patch:drinks`
/// - `DELETE /drinks/{id}` - delete, requires `delete:drinks`
/// - TraceLayer for request logging
/// - 30 second request timeout
/// - permissive CORS (any origin; Content-Type/Authorization headers)
/// - outermost envelope layer for framework-generated errors
pub fn build_routes(state: Arc<AppState>) -> Router {
    // Create JWKS client and token verifier from configuration
    let jwks_client = Arc::new(JwksClient::new(state.config.jwks_url.clone()));
    let jwt_validator = Arc::new(JwtValidator::new(
        jwks_client,
        state.config.auth_audience.clone(),
        state.config.auth_issuer.clone(),
        state.config.jwt_clock_skew_seconds,
    ));

    // One guard per protected endpoint; `require_permission` is the single
    // enforcement point for all of them.
    //
    // Layer order (bottom-to-top execution):
    // 1. TraceLayer - log request details (innermost)
    // 2. TimeoutLayer - bound request duration
    // 3. envelope_errors - normalize framework errors into the wire envelope
    // 4. CorsLayer - applied to every response, including rewritten ones (outermost)
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/drinks",
            get(handlers::list_drinks).post(handlers::create_drink.layer(
                middleware::from_fn_with_state(
                    PermissionGuard::new(jwt_validator.clone(), CREATE_PERMISSION),
                    require_permission,
                ),
            )),
        )
        .route(
            "/drinks-detail",
            get(handlers::list_drinks_detail.layer(middleware::from_fn_with_state(
                PermissionGuard::new(jwt_validator.clone(), LIST_DETAIL_PERMISSION),
                require_permission,
            ))),
        )
        .route(
            "/drinks/:id",
            patch(handlers::update_drink.layer(middleware::from_fn_with_state(
                PermissionGuard::new(jwt_validator.clone(), UPDATE_PERMISSION),
                require_permission,
            )))
            .delete(handlers::delete_drink.layer(middleware::from_fn_with_state(
                PermissionGuard::new(jwt_validator, DELETE_PERMISSION),
                require_permission,
            ))),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(envelope_errors))
        .layer(cors_layer())
}

/// Permissive CORS layer for the browser frontend.
///
/// All origins are allowed; the allowed headers and methods are the ones the
/// API actually serves plus OPTIONS preflight.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_methods([
            Method::GET,
            Method::PUT,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
}
