use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::{require_user, AppState};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::models::{NewRecipe, Recipe, RecipeWithIngredients};
use crate::suggestion::RecipeId;
use crate::validation::validate_new_recipe;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct RecipeQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub(crate) fn recipe_not_found(recipe_id: RecipeId) -> AppError {
    AppError::NotFound(format!("Recipe {recipe_id} not found"))
}

pub(crate) async fn load_recipe(state: &AppState, recipe_id: RecipeId) -> AppResult<RecipeWithIngredients> {
    db::read_recipe(&state.pool, recipe_id)
        .await?
        .ok_or_else(|| recipe_not_found(recipe_id))
}

/// 404 for unknown recipes, 403 for recipes authored by someone else
async fn require_author(state: &AppState, user_id: i64, recipe_id: RecipeId) -> AppResult<()> {
    let recipe = db::read_recipe_header(&state.pool, recipe_id)
        .await?
        .ok_or_else(|| recipe_not_found(recipe_id))?;

    if recipe.author_id != Some(user_id) {
        return Err(AppError::Forbidden(format!(
            "Recipe {recipe_id} belongs to another user"
        )));
    }
    Ok(())
}

/// Browse recipes, or search titles and ingredients with `q`
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(query): Query<RecipeQuery>,
) -> AppResult<Json<Vec<Recipe>>> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(AppError::Validation(format!(
            "Limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    let offset = query.offset.unwrap_or(0);
    if offset < 0 {
        return Err(AppError::Validation("Offset cannot be negative".to_string()));
    }

    let recipes = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(text) => db::search_recipes(&state.pool, text, limit, offset).await?,
        None => db::list_recipes(&state.pool, limit, offset).await?,
    };
    Ok(Json(recipes))
}

pub async fn get_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<RecipeId>,
) -> AppResult<Json<RecipeWithIngredients>> {
    Ok(Json(load_recipe(&state, recipe_id).await?))
}

pub async fn create_recipe(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(payload): Json<NewRecipe>,
) -> AppResult<(StatusCode, Json<RecipeWithIngredients>)> {
    let recipe = validate_new_recipe(&payload)?;
    require_user(&state.pool, user_id).await?;

    let recipe_id = db::create_recipe(&state.pool, Some(user_id), &recipe).await?;
    Ok((StatusCode::CREATED, Json(load_recipe(&state, recipe_id).await?)))
}

pub async fn update_recipe(
    State(state): State<AppState>,
    Path((user_id, recipe_id)): Path<(i64, RecipeId)>,
    Json(payload): Json<NewRecipe>,
) -> AppResult<Json<RecipeWithIngredients>> {
    let recipe = validate_new_recipe(&payload)?;
    require_user(&state.pool, user_id).await?;
    require_author(&state, user_id, recipe_id).await?;

    if !db::update_recipe(&state.pool, recipe_id, user_id, &recipe).await? {
        return Err(recipe_not_found(recipe_id));
    }
    Ok(Json(load_recipe(&state, recipe_id).await?))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    Path((user_id, recipe_id)): Path<(i64, RecipeId)>,
) -> AppResult<StatusCode> {
    require_user(&state.pool, user_id).await?;
    require_author(&state, user_id, recipe_id).await?;

    if db::delete_recipe(&state.pool, recipe_id, user_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(recipe_not_found(recipe_id))
    }
}
