//! Fridge inventory queries. Every call is scoped to one user.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::postgres::{PgExecutor, PgPool};
use std::collections::HashSet;
use tracing::info;

use super::ingredients::find_or_create_ingredient_with;
use crate::models::{InventoryItem, NewInventoryItem};
use crate::suggestion::IngredientId;

const INVENTORY_SELECT: &str = "SELECT inv.id, inv.user_id, inv.ingredient_id,
            i.name AS ingredient_name, inv.quantity, inv.unit, inv.expiry_date,
            inv.created_at, inv.updated_at
     FROM inventory_items inv
     JOIN ingredients i ON i.id = inv.ingredient_id";

/// Add an item to a user's inventory
pub async fn add_inventory_item<'e, E>(
    executor: E,
    user_id: i64,
    ingredient_id: IngredientId,
    quantity: f64,
    unit: Option<&str>,
    expiry_date: Option<NaiveDate>,
) -> Result<i64>
where
    E: PgExecutor<'e>,
{
    info!(user_id, ingredient_id, "Adding inventory item");

    let item_id: i64 = sqlx::query_scalar(
        "INSERT INTO inventory_items (user_id, ingredient_id, quantity, unit, expiry_date)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id",
    )
    .bind(user_id)
    .bind(ingredient_id)
    .bind(quantity)
    .bind(unit)
    .bind(expiry_date)
    .fetch_one(executor)
    .await
    .context("Failed to insert inventory item")?;

    info!(user_id, item_id, "Inventory item created");
    Ok(item_id)
}

/// Add several items, resolving their ingredients, all or nothing
///
/// Returns the new item ids in input order.
pub async fn add_inventory_items(
    pool: &PgPool,
    user_id: i64,
    items: &[NewInventoryItem],
) -> Result<Vec<i64>> {
    info!(user_id, count = items.len(), "Adding inventory items");

    let mut tx = pool.begin().await.context("Failed to start transaction")?;

    let mut item_ids = Vec::with_capacity(items.len());
    for item in items {
        let ingredient_id = find_or_create_ingredient_with(
            &mut *tx,
            &item.ingredient_name,
            item.category.as_deref(),
        )
        .await?;
        let item_id = add_inventory_item(
            &mut *tx,
            user_id,
            ingredient_id,
            item.quantity,
            item.unit.as_deref(),
            item.expiry_date,
        )
        .await?;
        item_ids.push(item_id);
    }

    tx.commit().await.context("Failed to commit inventory items")?;
    Ok(item_ids)
}

/// Read one of the user's inventory items
pub async fn read_inventory_item(
    pool: &PgPool,
    user_id: i64,
    item_id: i64,
) -> Result<Option<InventoryItem>> {
    sqlx::query_as::<_, InventoryItem>(&format!(
        "{INVENTORY_SELECT} WHERE inv.id = $1 AND inv.user_id = $2"
    ))
    .bind(item_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read inventory item")
}

/// The user's inventory, soonest expiry first, undated items last
pub async fn list_inventory(pool: &PgPool, user_id: i64) -> Result<Vec<InventoryItem>> {
    sqlx::query_as::<_, InventoryItem>(&format!(
        "{INVENTORY_SELECT} WHERE inv.user_id = $1
         ORDER BY inv.expiry_date ASC NULLS LAST, i.name ASC, inv.id ASC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list inventory")
}

/// Items expiring within `days` days, already expired ones included
pub async fn list_expiring_items(
    pool: &PgPool,
    user_id: i64,
    days: i32,
) -> Result<Vec<InventoryItem>> {
    sqlx::query_as::<_, InventoryItem>(&format!(
        "{INVENTORY_SELECT} WHERE inv.user_id = $1
           AND inv.expiry_date IS NOT NULL
           AND inv.expiry_date <= CURRENT_DATE + $2::INTEGER
         ORDER BY inv.expiry_date ASC, i.name ASC"
    ))
    .bind(user_id)
    .bind(days)
    .fetch_all(pool)
    .await
    .context("Failed to list expiring inventory items")
}

/// Replace quantity, unit and expiry of an item the user owns
pub async fn update_inventory_item(
    pool: &PgPool,
    user_id: i64,
    item_id: i64,
    quantity: f64,
    unit: Option<&str>,
    expiry_date: Option<NaiveDate>,
) -> Result<bool> {
    info!(user_id, item_id, "Updating inventory item");

    let rows_affected = sqlx::query(
        "UPDATE inventory_items
         SET quantity = $1, unit = $2, expiry_date = $3, updated_at = NOW()
         WHERE id = $4 AND user_id = $5",
    )
    .bind(quantity)
    .bind(unit)
    .bind(expiry_date)
    .bind(item_id)
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to update inventory item")?
    .rows_affected();

    if rows_affected > 0 {
        info!(user_id, item_id, "Inventory item updated");
        Ok(true)
    } else {
        info!(user_id, item_id, "No inventory item found for user");
        Ok(false)
    }
}

/// Remove an item the user owns
pub async fn delete_inventory_item(pool: &PgPool, user_id: i64, item_id: i64) -> Result<bool> {
    info!(user_id, item_id, "Deleting inventory item");

    let rows_affected = sqlx::query("DELETE FROM inventory_items WHERE id = $1 AND user_id = $2")
        .bind(item_id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to delete inventory item")?
        .rows_affected();

    if rows_affected > 0 {
        info!(user_id, item_id, "Inventory item deleted");
        Ok(true)
    } else {
        info!(user_id, item_id, "No inventory item found for user");
        Ok(false)
    }
}

/// Ingredients the user holds any nonzero amount of
pub async fn inventory_ingredient_ids(pool: &PgPool, user_id: i64) -> Result<HashSet<IngredientId>> {
    let ids: Vec<IngredientId> = sqlx::query_scalar(
        "SELECT DISTINCT ingredient_id FROM inventory_items WHERE user_id = $1 AND quantity > 0",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to read inventory ingredient ids")?;

    Ok(ids.into_iter().collect())
}

/// Names of the ingredients the user holds, alphabetically
pub async fn inventory_ingredient_names(pool: &PgPool, user_id: i64) -> Result<Vec<String>> {
    sqlx::query_scalar(
        "SELECT DISTINCT i.name
         FROM inventory_items inv
         JOIN ingredients i ON i.id = inv.ingredient_id
         WHERE inv.user_id = $1 AND inv.quantity > 0
         ORDER BY i.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to read inventory ingredient names")
}
