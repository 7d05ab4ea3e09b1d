//! Drink handlers.
//!
//! Implements the five drink endpoints:
//!
//! - `GET /drinks` - public listing, short serialization
//! - `GET /drinks-detail` - full listing (requires `get:drinks-detail`)
//! - `POST /drinks` - create (requires `post:drinks`)
//! - `PATCH /drinks/{id}` - partial update (requires `patch:drinks`)
//! - `DELETE /drinks/{id}` - delete (requires `delete:drinks`)
//!
//! Each protected handler receives the verified claims injected by the
//! authorization guard; no handler touches the repository before the guard
//! has passed. Storage failures are caught at the handler boundary and
//! re-raised as the endpoint's documented recovery code.

use crate::auth::Claims;
use crate::errors::ApiError;
use crate::models::{
    CreateDrinkRequest, DeleteDrinkResponse, DrinkDetailResponse, DrinkListResponse,
    UpdateDrinkRequest,
};
use crate::routes::AppState;
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Permission required by GET /drinks-detail.
pub const LIST_DETAIL_PERMISSION: &str = "get:drinks-detail";

/// Permission required by POST /drinks.
pub const CREATE_PERMISSION: &str = "post:drinks";

/// Permission required by PATCH /drinks/{id}.
pub const UPDATE_PERMISSION: &str = "patch:drinks";

/// Permission required by DELETE /drinks/{id}.
pub const DELETE_PERMISSION: &str = "delete:drinks";

// ============================================================================
// Handler: GET /drinks
// ============================================================================

/// Handler for GET /drinks (public).
///
/// Returns the short serialization of every drink: title and ingredient
/// colors, no recipe detail, regardless of authentication.
#[instrument(skip_all, name = "drinks.handlers.list")]
pub async fn list_drinks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DrinkListResponse>, ApiError> {
    let drinks = state.repo.list_all().await?;

    Ok(Json(DrinkListResponse::new(
        drinks.iter().map(|d| d.short()).collect(),
    )))
}

// ============================================================================
// Handler: GET /drinks-detail
// ============================================================================

/// Handler for GET /drinks-detail.
///
/// Returns the long serialization of every drink. The handler is the local
/// recovery boundary for storage errors: any repository failure surfaces as
/// a generic 422 rather than propagating raw.
#[instrument(skip_all, name = "drinks.handlers.list_detail")]
pub async fn list_drinks_detail(
    State(state): State<Arc<AppState>>,
    Extension(_claims): Extension<Claims>,
) -> Result<Json<DrinkDetailResponse>, ApiError> {
    let drinks = state
        .repo
        .list_all()
        .await
        .map_err(|e| {
            tracing::warn!(target: "drinks.handlers", error = %e, "Listing drinks failed");
            ApiError::Unprocessable("unprocessable".to_string())
        })?;

    Ok(Json(DrinkDetailResponse::new(
        drinks.iter().map(|d| d.long()).collect(),
    )))
}

// ============================================================================
// Handler: POST /drinks
// ============================================================================

/// Handler for POST /drinks.
///
/// Creates a new drink from a JSON body with `title` and `recipe` and
/// returns its long serialization as a one-element list. A missing or
/// malformed body, a missing field, or an insert failure all surface as 422.
#[instrument(skip_all, name = "drinks.handlers.create")]
pub async fn create_drink(
    State(state): State<Arc<AppState>>,
    Extension(_claims): Extension<Claims>,
    body: Option<Json<CreateDrinkRequest>>,
) -> Result<Json<DrinkDetailResponse>, ApiError> {
    let Json(request) = body.ok_or_else(|| {
        ApiError::Unprocessable("Request body must be a valid JSON object.".to_string())
    })?;

    let new_drink = request
        .validate()
        .map_err(|reason| ApiError::Unprocessable(reason.to_string()))?;

    let drink = state.repo.insert(new_drink).await.map_err(|e| {
        tracing::warn!(target: "drinks.handlers", error = %e, "Inserting drink failed");
        ApiError::Unprocessable("unprocessable".to_string())
    })?;

    info!(
        target: "drinks.handlers",
        drink_id = drink.id,
        "Drink created"
    );

    Ok(Json(DrinkDetailResponse::new(vec![drink.long()])))
}

// ============================================================================
// Handler: PATCH /drinks/{id}
// ============================================================================

/// Handler for PATCH /drinks/{id}.
///
/// Applies only the fields present in the request body; omitted fields are
/// preserved. Returns 404 when the drink does not exist; every update
/// failure after that surfaces as 400.
#[instrument(skip_all, name = "drinks.handlers.update", fields(drink_id = id))]
pub async fn update_drink(
    State(state): State<Arc<AppState>>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<i64>,
    body: Option<Json<UpdateDrinkRequest>>,
) -> Result<Json<DrinkDetailResponse>, ApiError> {
    let mut drink = state
        .repo
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Drink".to_string()))?;

    let Json(request) = body.ok_or_else(|| {
        ApiError::BadRequest("Request body must be a valid JSON object.".to_string())
    })?;

    if !request.has_changes() {
        return Err(ApiError::BadRequest("No changes provided.".to_string()));
    }

    request
        .validate()
        .map_err(|reason| ApiError::BadRequest(reason.to_string()))?;

    if let Some(title) = request.title {
        drink.title = title.trim().to_string();
    }
    if let Some(recipe) = request.recipe {
        drink.recipe = recipe;
    }

    state.repo.update(&drink).await.map_err(|e| {
        tracing::warn!(target: "drinks.handlers", error = %e, "Updating drink failed");
        ApiError::BadRequest("Bad Request".to_string())
    })?;

    info!(
        target: "drinks.handlers",
        drink_id = drink.id,
        "Drink updated"
    );

    Ok(Json(DrinkDetailResponse::new(vec![drink.long()])))
}

// ============================================================================
// Handler: DELETE /drinks/{id}
// ============================================================================

/// Handler for DELETE /drinks/{id}.
///
/// Returns 404 when the drink does not exist (deleting an already-deleted
/// id is not idempotent-success), 422 when the repository fails, and the
/// deleted id otherwise.
#[instrument(skip_all, name = "drinks.handlers.delete", fields(drink_id = id))]
pub async fn delete_drink(
    State(state): State<Arc<AppState>>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteDrinkResponse>, ApiError> {
    let drink = state
        .repo
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Drink".to_string()))?;

    state.repo.delete(&drink).await.map_err(|e| {
        tracing::warn!(target: "drinks.handlers", error = %e, "Deleting drink failed");
        ApiError::Unprocessable("unprocessable".to_string())
    })?;

    info!(
        target: "drinks.handlers",
        drink_id = drink.id,
        "Drink deleted"
    );

    Ok(Json(DeleteDrinkResponse::new(drink.id)))
}
