//! # Suggestion Source
//!
//! The suggestion engine is pure; this module gathers its three inputs for a
//! user and hands over complete snapshots. The source is a trait so the
//! engine can be fed from PostgreSQL in the service and from memory in tests.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPool;
use std::collections::HashSet;
use tracing::info;

use crate::db;
use crate::models::RecipeWithIngredients;
use crate::suggestion::{suggest_recipes, IngredientId, RecipeId, RecipeRequirements, Suggestion};

/// Read access to everything the engine consumes
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    type Recipe: RecipeRequirements + Send;

    /// Ingredients the user currently holds
    async fn inventory_ingredient_ids(&self, user_id: i64) -> Result<HashSet<IngredientId>>;

    /// Every recipe, in a stable order
    async fn recipe_catalog(&self) -> Result<Vec<Self::Recipe>>;

    async fn favorite_recipe_ids(&self, user_id: i64) -> Result<HashSet<RecipeId>>;
}

/// [`SuggestionSource`] backed by the service database
#[derive(Clone)]
pub struct PgSuggestionSource {
    pool: PgPool,
}

impl PgSuggestionSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SuggestionSource for PgSuggestionSource {
    type Recipe = RecipeWithIngredients;

    async fn inventory_ingredient_ids(&self, user_id: i64) -> Result<HashSet<IngredientId>> {
        db::inventory_ingredient_ids(&self.pool, user_id).await
    }

    async fn recipe_catalog(&self) -> Result<Vec<RecipeWithIngredients>> {
        db::list_recipe_catalog(&self.pool).await
    }

    async fn favorite_recipe_ids(&self, user_id: i64) -> Result<HashSet<RecipeId>> {
        db::favorite_recipe_ids(&self.pool, user_id).await
    }
}

/// Suggestions for one user
///
/// The three reads run concurrently; ranking starts once all have completed.
pub async fn suggest_for_user<S>(
    source: &S,
    user_id: i64,
    result_limit: usize,
) -> Result<Vec<Suggestion<S::Recipe>>>
where
    S: SuggestionSource + ?Sized,
{
    let (inventory, catalog, favorites) = tokio::try_join!(
        source.inventory_ingredient_ids(user_id),
        source.recipe_catalog(),
        source.favorite_recipe_ids(user_id),
    )?;

    let suggestions = suggest_recipes(&inventory, catalog, &favorites, result_limit);

    info!(
        user_id,
        inventory = inventory.len(),
        favorites = favorites.len(),
        suggestions = suggestions.len(),
        "Computed recipe suggestions"
    );
    Ok(suggestions)
}
