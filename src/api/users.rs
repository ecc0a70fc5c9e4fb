use axum::extract::{Path, State};
use axum::Json;

use super::{require_user, AppState};
use crate::db;
use crate::errors::AppResult;
use crate::models::{NewUser, User};
use crate::validation::validate_username;

/// Get or create the user with this username
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> AppResult<Json<User>> {
    let username = validate_username(&payload.username)?;
    let user = db::get_or_create_user(&state.pool, &username).await?;
    Ok(Json(user))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<User>> {
    Ok(Json(require_user(&state.pool, user_id).await?))
}
