use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::{require_user, AppState};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::models::{InventoryItem, InventoryItemUpdate, NewInventoryItem};
use crate::validation::{
    validate_expiring_window, validate_inventory_update, validate_new_inventory_item,
};

const DEFAULT_EXPIRING_DAYS: i32 = 3;
const MAX_BULK_ITEMS: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    pub days: Option<i32>,
}

/// Confirmed receipt items
#[derive(Debug, Deserialize)]
pub struct BulkPayload {
    pub items: Vec<NewInventoryItem>,
}

fn item_not_found(item_id: i64) -> AppError {
    AppError::NotFound(format!("Inventory item {item_id} not found"))
}

/// Store items in one transaction and read them back with ingredient names
async fn store_items(
    state: &AppState,
    user_id: i64,
    items: &[NewInventoryItem],
) -> AppResult<Vec<InventoryItem>> {
    let item_ids = db::add_inventory_items(&state.pool, user_id, items).await?;

    let mut stored = Vec::with_capacity(item_ids.len());
    for item_id in item_ids {
        let item = db::read_inventory_item(&state.pool, user_id, item_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!("Inventory item {item_id} vanished after insert"))
            })?;
        stored.push(item);
    }
    Ok(stored)
}

pub async fn list_inventory(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<InventoryItem>>> {
    require_user(&state.pool, user_id).await?;
    Ok(Json(db::list_inventory(&state.pool, user_id).await?))
}

pub async fn list_expiring(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<ExpiringQuery>,
) -> AppResult<Json<Vec<InventoryItem>>> {
    let days = validate_expiring_window(query.days.unwrap_or(DEFAULT_EXPIRING_DAYS))?;
    require_user(&state.pool, user_id).await?;
    Ok(Json(db::list_expiring_items(&state.pool, user_id, days).await?))
}

pub async fn add_item(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(payload): Json<NewInventoryItem>,
) -> AppResult<(StatusCode, Json<InventoryItem>)> {
    let item = validate_new_inventory_item(&payload)?;
    require_user(&state.pool, user_id).await?;

    let mut stored = store_items(&state, user_id, std::slice::from_ref(&item)).await?;
    let item = stored
        .pop()
        .ok_or_else(|| AppError::Internal("Inventory insert returned no item".to_string()))?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Add several items at once; nothing is stored unless every item is
pub async fn add_items(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(payload): Json<BulkPayload>,
) -> AppResult<(StatusCode, Json<Vec<InventoryItem>>)> {
    if payload.items.is_empty() {
        return Err(AppError::Validation("No items to add".to_string()));
    }
    if payload.items.len() > MAX_BULK_ITEMS {
        return Err(AppError::Validation(format!(
            "Cannot add more than {MAX_BULK_ITEMS} items at once"
        )));
    }

    let items = payload
        .items
        .iter()
        .map(validate_new_inventory_item)
        .collect::<AppResult<Vec<_>>>()?;

    require_user(&state.pool, user_id).await?;

    let stored = store_items(&state, user_id, &items).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path((user_id, item_id)): Path<(i64, i64)>,
    Json(payload): Json<InventoryItemUpdate>,
) -> AppResult<Json<InventoryItem>> {
    let update = validate_inventory_update(&payload)?;
    require_user(&state.pool, user_id).await?;

    let updated = db::update_inventory_item(
        &state.pool,
        user_id,
        item_id,
        update.quantity,
        update.unit.as_deref(),
        update.expiry_date,
    )
    .await?;
    if !updated {
        return Err(item_not_found(item_id));
    }

    db::read_inventory_item(&state.pool, user_id, item_id)
        .await?
        .map(Json)
        .ok_or_else(|| item_not_found(item_id))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path((user_id, item_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    require_user(&state.pool, user_id).await?;

    if db::delete_inventory_item(&state.pool, user_id, item_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(item_not_found(item_id))
    }
}
