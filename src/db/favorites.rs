//! Favorite recipe marks.

use anyhow::{Context, Result};
use sqlx::postgres::PgPool;
use std::collections::HashSet;
use tracing::info;

use crate::models::FavoriteRecipe;
use crate::suggestion::RecipeId;

/// Mark a recipe as favorite. Returns `false` when it already was.
pub async fn add_favorite(pool: &PgPool, user_id: i64, recipe_id: RecipeId) -> Result<bool> {
    info!(user_id, recipe_id, "Adding favorite");

    let rows_affected = sqlx::query(
        "INSERT INTO favorites (user_id, recipe_id) VALUES ($1, $2)
         ON CONFLICT (user_id, recipe_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .context("Failed to add favorite")?
    .rows_affected();

    Ok(rows_affected > 0)
}

pub async fn remove_favorite(pool: &PgPool, user_id: i64, recipe_id: RecipeId) -> Result<bool> {
    info!(user_id, recipe_id, "Removing favorite");

    let rows_affected = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await
        .context("Failed to remove favorite")?
        .rows_affected();

    Ok(rows_affected > 0)
}

/// Favorite recipes, most recently marked first
pub async fn list_favorites(pool: &PgPool, user_id: i64) -> Result<Vec<FavoriteRecipe>> {
    sqlx::query_as::<_, FavoriteRecipe>(
        "SELECT r.id, r.author_id, r.title, r.description, r.instructions,
                r.prep_time_minutes, r.servings, r.created_at,
                f.created_at AS favorited_at
         FROM favorites f
         JOIN recipes r ON r.id = f.recipe_id
         WHERE f.user_id = $1
         ORDER BY f.created_at DESC, r.id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list favorites")
}

pub async fn favorite_recipe_ids(pool: &PgPool, user_id: i64) -> Result<HashSet<RecipeId>> {
    let ids: Vec<RecipeId> = sqlx::query_scalar("SELECT recipe_id FROM favorites WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to read favorite recipe ids")?;

    Ok(ids.into_iter().collect())
}
