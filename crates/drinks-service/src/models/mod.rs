//! Drinks service models.
//!
//! Contains the drink entity, its two wire serializations and the
//! request/response types used by the handlers.
//!
//! A drink has two serializations tied to the endpoint's authorization tier:
//! "short" (title plus ingredient colors, for public access) and "long"
//! (the full recipe, for authorized access). Choosing between them is an
//! endpoint decision, not a storage concern.

use serde::{Deserialize, Serialize};

/// Maximum drink title length.
pub const MAX_TITLE_LENGTH: usize = 100;

/// One ingredient of a drink recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    /// Display color of the ingredient layer.
    pub color: String,

    /// Ingredient name.
    pub name: String,

    /// Relative parts of this ingredient in the mix.
    pub parts: i64,
}

/// A drink as held by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drink {
    /// Unique drink identifier.
    pub id: i64,

    /// Drink title (unique).
    pub title: String,

    /// Full recipe.
    pub recipe: Vec<RecipeIngredient>,
}

/// A new drink prior to insertion (no identifier yet).
#[derive(Debug, Clone)]
pub struct NewDrink {
    /// Drink title.
    pub title: String,

    /// Full recipe.
    pub recipe: Vec<RecipeIngredient>,
}

/// Short serialization: title and ingredient colors only.
///
/// Returned to unauthenticated callers; carries no recipe detail.
#[derive(Debug, Clone, Serialize)]
pub struct DrinkShort {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<ShortIngredient>,
}

/// One recipe entry in the short serialization.
#[derive(Debug, Clone, Serialize)]
pub struct ShortIngredient {
    pub color: String,
}

/// Long serialization: the full recipe.
///
/// Returned only on endpoints behind a permission check.
#[derive(Debug, Clone, Serialize)]
pub struct DrinkLong {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<RecipeIngredient>,
}

impl Drink {
    /// Short serialization of this drink.
    pub fn short(&self) -> DrinkShort {
        DrinkShort {
            id: self.id,
            title: self.title.clone(),
            recipe: self
                .recipe
                .iter()
                .map(|ingredient| ShortIngredient {
                    color: ingredient.color.clone(),
                })
                .collect(),
        }
    }

    /// Long serialization of this drink.
    pub fn long(&self) -> DrinkLong {
        DrinkLong {
            id: self.id,
            title: self.title.clone(),
            recipe: self.recipe.clone(),
        }
    }
}

// ============================================================================
// Request types
// ============================================================================

/// Request body for POST /drinks.
///
/// Fields are optional at the deserialization layer so that missing fields
/// surface as the endpoint's documented recovery code instead of a raw
/// framework rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDrinkRequest {
    /// Drink title.
    pub title: Option<String>,

    /// Full recipe.
    pub recipe: Option<Vec<RecipeIngredient>>,
}

impl CreateDrinkRequest {
    /// Validate the request and convert it into a `NewDrink`.
    ///
    /// # Errors
    ///
    /// Returns an error message if a required field is missing or invalid.
    pub fn validate(self) -> Result<NewDrink, &'static str> {
        let title = self.title.ok_or("title is required")?;
        let title = title.trim().to_string();

        if title.is_empty() {
            return Err("title must not be empty");
        }
        if title.len() > MAX_TITLE_LENGTH {
            return Err("title is too long");
        }

        let recipe = self.recipe.ok_or("recipe is required")?;
        validate_recipe(&recipe)?;

        Ok(NewDrink { title, recipe })
    }
}

/// Request body for PATCH /drinks/{id}.
///
/// All fields are optional - only provided fields are updated, omitted
/// fields are preserved.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDrinkRequest {
    /// New drink title.
    pub title: Option<String>,

    /// New full recipe (replaces the stored one).
    pub recipe: Option<Vec<RecipeIngredient>>,
}

impl UpdateDrinkRequest {
    /// Check if the request contains any changes.
    pub fn has_changes(&self) -> bool {
        self.title.is_some() || self.recipe.is_some()
    }

    /// Validate the provided fields.
    ///
    /// # Errors
    ///
    /// Returns an error message if a provided field is invalid.
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(title) = &self.title {
            let title = title.trim();
            if title.is_empty() {
                return Err("title must not be empty");
            }
            if title.len() > MAX_TITLE_LENGTH {
                return Err("title is too long");
            }
        }

        if let Some(recipe) = &self.recipe {
            validate_recipe(recipe)?;
        }

        Ok(())
    }
}

fn validate_recipe(recipe: &[RecipeIngredient]) -> Result<(), &'static str> {
    for ingredient in recipe {
        if ingredient.name.trim().is_empty() {
            return Err("ingredient name must not be empty");
        }
        if ingredient.color.trim().is_empty() {
            return Err("ingredient color must not be empty");
        }
        if ingredient.parts < 1 {
            return Err("ingredient parts must be at least 1");
        }
    }
    Ok(())
}

// ============================================================================
// Response types
// ============================================================================

/// Response for GET /drinks (short serializations).
#[derive(Debug, Clone, Serialize)]
pub struct DrinkListResponse {
    pub success: bool,
    pub drinks: Vec<DrinkShort>,
}

impl DrinkListResponse {
    pub fn new(drinks: Vec<DrinkShort>) -> Self {
        Self {
            success: true,
            drinks,
        }
    }
}

/// Response for the authorized endpoints (long serializations).
#[derive(Debug, Clone, Serialize)]
pub struct DrinkDetailResponse {
    pub success: bool,
    pub drinks: Vec<DrinkLong>,
}

impl DrinkDetailResponse {
    pub fn new(drinks: Vec<DrinkLong>) -> Self {
        Self {
            success: true,
            drinks,
        }
    }
}

/// Response for DELETE /drinks/{id}.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteDrinkResponse {
    pub success: bool,
    pub delete: i64,
}

impl DeleteDrinkResponse {
    pub fn new(id: i64) -> Self {
        Self { success: true, delete: id }
    }
}
