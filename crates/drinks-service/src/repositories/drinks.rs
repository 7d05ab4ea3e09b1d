//! Drinks repository.
//!
//! The repository capability required from the persistence layer:
//! list, get-by-id, insert, update and delete of drink records. Handlers
//! depend on the trait, not the Postgres implementation, which keeps the
//! storage collaborator swappable and mockable.
//!
//! # Security
//!
//! - All queries use parameterized statements (SQL injection safe)
//! - Storage errors carry no client-facing detail; they are logged and
//!   surfaced as generic database errors

use crate::errors::ApiError;
use crate::models::{Drink, NewDrink, RecipeIngredient};
use sqlx::{PgPool, Row};
use tracing::instrument;

/// Repository capability for drink records.
#[async_trait::async_trait]
pub trait DrinkRepository: Send + Sync {
    /// Fetch all drinks ordered by id.
    async fn list_all(&self) -> Result<Vec<Drink>, ApiError>;

    /// Fetch one drink by id, `None` if absent.
    async fn get(&self, id: i64) -> Result<Option<Drink>, ApiError>;

    /// Insert a new drink and return it with its assigned id.
    async fn insert(&self, new_drink: NewDrink) -> Result<Drink, ApiError>;

    /// Persist the given drink's current state.
    async fn update(&self, drink: &Drink) -> Result<(), ApiError>;

    /// Delete the given drink.
    async fn delete(&self, drink: &Drink) -> Result<(), ApiError>;
}

/// Postgres-backed drinks repository.
pub struct PgDrinkRepository {
    pool: PgPool,
}

impl PgDrinkRepository {
    /// Create a repository over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl DrinkRepository for PgDrinkRepository {
    #[instrument(skip_all, name = "drinks.repo.list_all")]
    async fn list_all(&self) -> Result<Vec<Drink>, ApiError> {
        let rows = sqlx::query(
            r#"
            SELECT drink_id, title, recipe
            FROM drinks
            ORDER BY drink_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(map_row_to_drink).collect()
    }

    #[instrument(skip_all, name = "drinks.repo.get", fields(drink_id = id))]
    async fn get(&self, id: i64) -> Result<Option<Drink>, ApiError> {
        let row = sqlx::query(
            r#"
            SELECT drink_id, title, recipe
            FROM drinks
            WHERE drink_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_row_to_drink).transpose()
    }

    #[instrument(skip_all, name = "drinks.repo.insert")]
    async fn insert(&self, new_drink: NewDrink) -> Result<Drink, ApiError> {
        let recipe_json = serde_json::to_value(&new_drink.recipe)
            .map_err(|e| ApiError::Database(e.to_string()))?;

        let row = sqlx::query(
            r#"
            INSERT INTO drinks (title, recipe)
            VALUES ($1, $2)
            RETURNING drink_id, title, recipe
            "#,
        )
        .bind(&new_drink.title)
        .bind(recipe_json)
        .fetch_one(&self.pool)
        .await?;

        map_row_to_drink(row)
    }

    #[instrument(skip_all, name = "drinks.repo.update", fields(drink_id = drink.id))]
    async fn update(&self, drink: &Drink) -> Result<(), ApiError> {
        let recipe_json =
            serde_json::to_value(&drink.recipe).map_err(|e| ApiError::Database(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE drinks
            SET title = $2, recipe = $3, updated_at = NOW()
            WHERE drink_id = $1
            "#,
        )
        .bind(drink.id)
        .bind(&drink.title)
        .bind(recipe_json)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::Database(format!(
                "update affected no rows for drink {}",
                drink.id
            )));
        }

        Ok(())
    }

    #[instrument(skip_all, name = "drinks.repo.delete", fields(drink_id = drink.id))]
    async fn delete(&self, drink: &Drink) -> Result<(), ApiError> {
        let result = sqlx::query(
            r#"
            DELETE FROM drinks
            WHERE drink_id = $1
            "#,
        )
        .bind(drink.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::Database(format!(
                "delete affected no rows for drink {}",
                drink.id
            )));
        }

        Ok(())
    }
}

/// Map a database row to a Drink.
fn map_row_to_drink(row: sqlx::postgres::PgRow) -> Result<Drink, ApiError> {
    let recipe_json: serde_json::Value = row.get("recipe");
    let recipe: Vec<RecipeIngredient> = serde_json::from_value(recipe_json).map_err(|e| {
        tracing::error!(target: "drinks.repo", error = %e, "Stored recipe is not deserializable");
        ApiError::Database(e.to_string())
    })?;

    Ok(Drink {
        id: row.get("drink_id"),
        title: row.get("title"),
        recipe,
    })
}

/// In-memory drinks repository for testing.
///
/// Mirrors the Postgres implementation's observable behavior; a call
/// counter lets tests assert that rejected requests never reach storage.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use tokio::sync::RwLock;

    /// Mock drinks repository backed by a Vec.
    pub struct InMemoryDrinks {
        drinks: RwLock<Vec<Drink>>,
        next_id: AtomicI64,
        call_count: AtomicUsize,
        fail_reads: bool,
        fail_writes: bool,
    }

    impl InMemoryDrinks {
        /// Create an empty repository.
        pub fn new() -> Self {
            Self::with_drinks(Vec::new())
        }

        /// Create a repository seeded with the given drinks.
        pub fn with_drinks(drinks: Vec<Drink>) -> Self {
            let next_id = drinks.iter().map(|d| d.id).max().unwrap_or(0) + 1;
            Self {
                drinks: RwLock::new(drinks),
                next_id: AtomicI64::new(next_id),
                call_count: AtomicUsize::new(0),
                fail_reads: false,
                fail_writes: false,
            }
        }

        /// Create a repository where every operation fails.
        pub fn failing() -> Self {
            Self {
                fail_reads: true,
                fail_writes: true,
                ..Self::new()
            }
        }

        /// Create a seeded repository where reads succeed but writes fail.
        pub fn failing_writes(drinks: Vec<Drink>) -> Self {
            Self {
                fail_writes: true,
                ..Self::with_drinks(drinks)
            }
        }

        /// Number of repository calls made.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        fn record_call(&self) {
            self.call_count.fetch_add(1, Ordering::SeqCst);
        }

        fn read_failure(&self) -> Result<(), ApiError> {
            if self.fail_reads {
                return Err(ApiError::Database("mock repository read failure".to_string()));
            }
            Ok(())
        }

        fn write_failure(&self) -> Result<(), ApiError> {
            if self.fail_writes {
                return Err(ApiError::Database(
                    "mock repository write failure".to_string(),
                ));
            }
            Ok(())
        }
    }

    impl Default for InMemoryDrinks {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait::async_trait]
    impl DrinkRepository for InMemoryDrinks {
        async fn list_all(&self) -> Result<Vec<Drink>, ApiError> {
            self.record_call();
            self.read_failure()?;
            Ok(self.drinks.read().await.clone())
        }

        async fn get(&self, id: i64) -> Result<Option<Drink>, ApiError> {
            self.record_call();
            self.read_failure()?;
            Ok(self.drinks.read().await.iter().find(|d| d.id == id).cloned())
        }

        async fn insert(&self, new_drink: NewDrink) -> Result<Drink, ApiError> {
            self.record_call();
            self.write_failure()?;

            let mut drinks = self.drinks.write().await;
            if drinks.iter().any(|d| d.title == new_drink.title) {
                return Err(ApiError::Database("duplicate drink title".to_string()));
            }

            let drink = Drink {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                title: new_drink.title,
                recipe: new_drink.recipe,
            };
            drinks.push(drink.clone());
            Ok(drink)
        }

        async fn update(&self, drink: &Drink) -> Result<(), ApiError> {
            self.record_call();
            self.write_failure()?;

            let mut drinks = self.drinks.write().await;
            match drinks.iter_mut().find(|d| d.id == drink.id) {
                Some(stored) => {
                    *stored = drink.clone();
                    Ok(())
                }
                None => Err(ApiError::Database(format!(
                    "update affected no rows for drink {}",
                    drink.id
                ))),
            }
        }

        async fn delete(&self, drink: &Drink) -> Result<(), ApiError> {
            self.record_call();
            self.write_failure()?;

            let mut drinks = self.drinks.write().await;
            let before = drinks.len();
            drinks.retain(|d| d.id != drink.id);
            if drinks.len() == before {
                return Err(ApiError::Database(format!(
                    "delete affected no rows for drink {}",
                    drink.id
                )));
            }
            Ok(())
        }
    }

}
