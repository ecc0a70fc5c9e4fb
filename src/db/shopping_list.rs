//! Shopping list queries. Every call is scoped to one user.

use anyhow::{Context, Result};
use sqlx::postgres::PgPool;
use tracing::info;

use crate::models::ShoppingListItem;
use crate::suggestion::{IngredientId, RecipeId};

const SHOPPING_COLUMNS: &str = "id, user_id, ingredient_id, name, quantity, unit, checked, created_at";

pub async fn add_shopping_item(
    pool: &PgPool,
    user_id: i64,
    ingredient_id: Option<IngredientId>,
    name: &str,
    quantity: Option<f64>,
    unit: Option<&str>,
) -> Result<i64> {
    info!(user_id, name, "Adding shopping list item");

    let item_id: i64 = sqlx::query_scalar(
        "INSERT INTO shopping_list_items (user_id, ingredient_id, name, quantity, unit)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id",
    )
    .bind(user_id)
    .bind(ingredient_id)
    .bind(name)
    .bind(quantity)
    .bind(unit)
    .fetch_one(pool)
    .await
    .context("Failed to insert shopping list item")?;

    Ok(item_id)
}

/// Unchecked items first, then in insertion order
pub async fn list_shopping_items(pool: &PgPool, user_id: i64) -> Result<Vec<ShoppingListItem>> {
    sqlx::query_as::<_, ShoppingListItem>(&format!(
        "SELECT {SHOPPING_COLUMNS} FROM shopping_list_items
         WHERE user_id = $1
         ORDER BY checked ASC, id ASC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list shopping list items")
}

pub async fn read_shopping_item(
    pool: &PgPool,
    user_id: i64,
    item_id: i64,
) -> Result<Option<ShoppingListItem>> {
    sqlx::query_as::<_, ShoppingListItem>(&format!(
        "SELECT {SHOPPING_COLUMNS} FROM shopping_list_items WHERE id = $1 AND user_id = $2"
    ))
    .bind(item_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read shopping list item")
}

pub async fn set_shopping_item_checked(
    pool: &PgPool,
    user_id: i64,
    item_id: i64,
    checked: bool,
) -> Result<bool> {
    let rows_affected = sqlx::query(
        "UPDATE shopping_list_items SET checked = $1 WHERE id = $2 AND user_id = $3",
    )
    .bind(checked)
    .bind(item_id)
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to update shopping list item")?
    .rows_affected();

    Ok(rows_affected > 0)
}

pub async fn delete_shopping_item(pool: &PgPool, user_id: i64, item_id: i64) -> Result<bool> {
    info!(user_id, item_id, "Deleting shopping list item");

    let rows_affected =
        sqlx::query("DELETE FROM shopping_list_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(pool)
            .await
            .context("Failed to delete shopping list item")?
            .rows_affected();

    Ok(rows_affected > 0)
}

/// Remove every checked item, returning how many went
pub async fn clear_checked_shopping_items(pool: &PgPool, user_id: i64) -> Result<u64> {
    let removed = sqlx::query("DELETE FROM shopping_list_items WHERE user_id = $1 AND checked")
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to clear checked shopping list items")?
        .rows_affected();

    info!(user_id, removed, "Cleared checked shopping list items");
    Ok(removed)
}

/// Put the recipe's ingredients the user lacks on their shopping list
///
/// Skips ingredients held in the inventory and ingredients already waiting
/// unchecked on the list. A recipe naming one ingredient twice adds it once.
/// Returns the number of items added.
pub async fn add_missing_recipe_ingredients(
    pool: &PgPool,
    user_id: i64,
    recipe_id: RecipeId,
) -> Result<u64> {
    info!(user_id, recipe_id, "Adding missing recipe ingredients to shopping list");

    let added = sqlx::query(
        "INSERT INTO shopping_list_items (user_id, ingredient_id, name, quantity, unit)
         SELECT DISTINCT ON (ri.ingredient_id)
                $1::BIGINT, ri.ingredient_id, i.name, ri.quantity, ri.unit
         FROM recipe_ingredients ri
         JOIN ingredients i ON i.id = ri.ingredient_id
         WHERE ri.recipe_id = $2
           AND NOT EXISTS (
               SELECT 1 FROM inventory_items inv
               WHERE inv.user_id = $1 AND inv.ingredient_id = ri.ingredient_id AND inv.quantity > 0
           )
           AND NOT EXISTS (
               SELECT 1 FROM shopping_list_items s
               WHERE s.user_id = $1 AND s.ingredient_id = ri.ingredient_id AND NOT s.checked
           )
         ORDER BY ri.ingredient_id, ri.position",
    )
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .context("Failed to add missing recipe ingredients")?
    .rows_affected();

    info!(user_id, recipe_id, added, "Missing ingredients added");
    Ok(added)
}
