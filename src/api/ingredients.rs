use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::AppState;
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::models::Ingredient;
use crate::validation::validate_barcode;

const DEFAULT_SEARCH_LIMIT: i64 = 20;
const MAX_SEARCH_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct IngredientQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BarcodePayload {
    pub barcode: String,
}

/// Prefix search for autocompletion, or the whole list without `q`
pub async fn search_ingredients(
    State(state): State<AppState>,
    Query(query): Query<IngredientQuery>,
) -> AppResult<Json<Vec<Ingredient>>> {
    let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    if !(1..=MAX_SEARCH_LIMIT).contains(&limit) {
        return Err(AppError::Validation(format!(
            "Limit must be between 1 and {MAX_SEARCH_LIMIT}"
        )));
    }

    let ingredients = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(prefix) => db::search_ingredients(&state.pool, prefix, limit).await?,
        None => db::list_ingredients(&state.pool).await?,
    };
    Ok(Json(ingredients))
}

pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(ingredient_id): Path<i64>,
) -> AppResult<Json<Ingredient>> {
    db::read_ingredient(&state.pool, ingredient_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Ingredient {ingredient_id} not found")))
}

/// Remember which product barcode an ingredient is bought as
pub async fn set_barcode(
    State(state): State<AppState>,
    Path(ingredient_id): Path<i64>,
    Json(payload): Json<BarcodePayload>,
) -> AppResult<Json<Ingredient>> {
    let barcode = validate_barcode(&payload.barcode)?;

    if !db::set_ingredient_barcode(&state.pool, ingredient_id, &barcode).await? {
        return Err(AppError::NotFound(format!(
            "Ingredient {ingredient_id} not found"
        )));
    }

    get_ingredient(State(state), Path(ingredient_id)).await
}
