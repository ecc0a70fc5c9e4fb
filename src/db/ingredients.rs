//! Ingredient catalog queries.

use anyhow::{Context, Result};
use sqlx::postgres::{PgExecutor, PgPool};
use tracing::debug;

use crate::ingredient_names::normalize_ingredient_name;
use crate::models::Ingredient;
use crate::suggestion::IngredientId;

const INGREDIENT_COLUMNS: &str = "id, name, category, barcode, created_at";

/// Resolve an ingredient by normalised name, inserting it when unknown
///
/// An existing ingredient without a category picks up the given one.
pub async fn find_or_create_ingredient_with<'e, E>(
    executor: E,
    name: &str,
    category: Option<&str>,
) -> Result<IngredientId>
where
    E: PgExecutor<'e>,
{
    let normalized = normalize_ingredient_name(name);
    if normalized.is_empty() {
        anyhow::bail!("Ingredient name {name:?} is empty after normalisation");
    }

    let ingredient_id: IngredientId = sqlx::query_scalar(
        "INSERT INTO ingredients (name, category) VALUES ($1, $2)
         ON CONFLICT (name) DO UPDATE
             SET category = COALESCE(ingredients.category, EXCLUDED.category)
         RETURNING id",
    )
    .bind(&normalized)
    .bind(category)
    .fetch_one(executor)
    .await
    .with_context(|| format!("Failed to find or create ingredient {normalized:?}"))?;

    debug!(ingredient_id, name = %normalized, "Resolved ingredient");
    Ok(ingredient_id)
}

pub async fn find_or_create_ingredient(
    pool: &PgPool,
    name: &str,
    category: Option<&str>,
) -> Result<IngredientId> {
    find_or_create_ingredient_with(pool, name, category).await
}

/// Look an ingredient up by name without creating it
pub async fn find_ingredient_by_name(pool: &PgPool, name: &str) -> Result<Option<Ingredient>> {
    let normalized = normalize_ingredient_name(name);

    sqlx::query_as::<_, Ingredient>(&format!(
        "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE name = $1"
    ))
    .bind(normalized)
    .fetch_optional(pool)
    .await
    .context("Failed to find ingredient by name")
}

pub async fn read_ingredient(pool: &PgPool, ingredient_id: IngredientId) -> Result<Option<Ingredient>> {
    sqlx::query_as::<_, Ingredient>(&format!(
        "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE id = $1"
    ))
    .bind(ingredient_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read ingredient")
}

/// All ingredients, alphabetically
pub async fn list_ingredients(pool: &PgPool) -> Result<Vec<Ingredient>> {
    sqlx::query_as::<_, Ingredient>(&format!(
        "SELECT {INGREDIENT_COLUMNS} FROM ingredients ORDER BY name"
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list ingredients")
}

/// Ingredients whose name starts with `prefix`, for autocompletion
pub async fn search_ingredients(pool: &PgPool, prefix: &str, limit: i64) -> Result<Vec<Ingredient>> {
    let pattern = format!("{}%", super::escape_like(&normalize_ingredient_name(prefix)));

    sqlx::query_as::<_, Ingredient>(&format!(
        "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE name LIKE $1 ORDER BY name LIMIT $2"
    ))
    .bind(pattern)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to search ingredients")
}

/// Remember a product barcode for an ingredient
pub async fn set_ingredient_barcode(
    pool: &PgPool,
    ingredient_id: IngredientId,
    barcode: &str,
) -> Result<bool> {
    let rows_affected = sqlx::query("UPDATE ingredients SET barcode = $1 WHERE id = $2")
        .bind(barcode)
        .bind(ingredient_id)
        .execute(pool)
        .await
        .context("Failed to set ingredient barcode")?
        .rows_affected();

    Ok(rows_affected > 0)
}
