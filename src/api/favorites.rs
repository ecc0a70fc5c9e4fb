use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::recipes::recipe_not_found;
use super::{require_user, AppState};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::models::FavoriteRecipe;
use crate::suggestion::RecipeId;

pub async fn list_favorites(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<FavoriteRecipe>>> {
    require_user(&state.pool, user_id).await?;
    Ok(Json(db::list_favorites(&state.pool, user_id).await?))
}

/// Idempotent: marking a favorite twice is not an error
pub async fn add_favorite(
    State(state): State<AppState>,
    Path((user_id, recipe_id)): Path<(i64, RecipeId)>,
) -> AppResult<StatusCode> {
    require_user(&state.pool, user_id).await?;
    if db::read_recipe_header(&state.pool, recipe_id).await?.is_none() {
        return Err(recipe_not_found(recipe_id));
    }

    db::add_favorite(&state.pool, user_id, recipe_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    Path((user_id, recipe_id)): Path<(i64, RecipeId)>,
) -> AppResult<StatusCode> {
    require_user(&state.pool, user_id).await?;

    if db::remove_favorite(&state.pool, user_id, recipe_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!(
            "Recipe {recipe_id} is not a favorite"
        )))
    }
}
