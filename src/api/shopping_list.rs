use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::recipes::recipe_not_found;
use super::{require_user, AppState};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::models::{NewShoppingItem, ShoppingItemUpdate, ShoppingListItem};
use crate::suggestion::RecipeId;
use crate::validation::validate_new_shopping_item;

#[derive(Debug, Serialize)]
pub struct Removed {
    pub removed: u64,
}

#[derive(Debug, Serialize)]
pub struct Added {
    pub added: u64,
}

fn item_not_found(item_id: i64) -> AppError {
    AppError::NotFound(format!("Shopping list item {item_id} not found"))
}

pub async fn list_items(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<ShoppingListItem>>> {
    require_user(&state.pool, user_id).await?;
    Ok(Json(db::list_shopping_items(&state.pool, user_id).await?))
}

/// Add a free text item, linked to an ingredient when one has that name
pub async fn add_item(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(payload): Json<NewShoppingItem>,
) -> AppResult<(StatusCode, Json<ShoppingListItem>)> {
    let item = validate_new_shopping_item(&payload)?;
    require_user(&state.pool, user_id).await?;

    let ingredient_id = db::find_ingredient_by_name(&state.pool, &item.name)
        .await?
        .map(|ingredient| ingredient.id);

    let item_id = db::add_shopping_item(
        &state.pool,
        user_id,
        ingredient_id,
        &item.name,
        item.quantity,
        item.unit.as_deref(),
    )
    .await?;

    let stored = db::read_shopping_item(&state.pool, user_id, item_id)
        .await?
        .ok_or_else(|| item_not_found(item_id))?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path((user_id, item_id)): Path<(i64, i64)>,
    Json(payload): Json<ShoppingItemUpdate>,
) -> AppResult<Json<ShoppingListItem>> {
    require_user(&state.pool, user_id).await?;

    if !db::set_shopping_item_checked(&state.pool, user_id, item_id, payload.checked).await? {
        return Err(item_not_found(item_id));
    }

    db::read_shopping_item(&state.pool, user_id, item_id)
        .await?
        .map(Json)
        .ok_or_else(|| item_not_found(item_id))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path((user_id, item_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    require_user(&state.pool, user_id).await?;

    if db::delete_shopping_item(&state.pool, user_id, item_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(item_not_found(item_id))
    }
}

pub async fn clear_checked(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Removed>> {
    require_user(&state.pool, user_id).await?;
    let removed = db::clear_checked_shopping_items(&state.pool, user_id).await?;
    Ok(Json(Removed { removed }))
}

/// Put what the user is missing for a recipe on their list
pub async fn add_from_recipe(
    State(state): State<AppState>,
    Path((user_id, recipe_id)): Path<(i64, RecipeId)>,
) -> AppResult<Json<Added>> {
    require_user(&state.pool, user_id).await?;
    if db::read_recipe_header(&state.pool, recipe_id).await?.is_none() {
        return Err(recipe_not_found(recipe_id));
    }

    let added = db::add_missing_recipe_ingredients(&state.pool, user_id, recipe_id).await?;
    Ok(Json(Added { added }))
}
