use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{require_user, AppState};
use crate::config::MAX_SUGGESTION_LIMIT;
use crate::errors::{AppError, AppResult};
use crate::models::RecipeWithIngredients;
use crate::store::{suggest_for_user, PgSuggestionSource};
use crate::suggestion::Suggestion;

#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<Suggestion<RecipeWithIngredients>>,
}

pub async fn get_suggestions(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<SuggestionQuery>,
) -> AppResult<Json<SuggestionsResponse>> {
    let limit = query.limit.unwrap_or(state.config.suggestion_limit);
    if !(1..=MAX_SUGGESTION_LIMIT).contains(&limit) {
        return Err(AppError::Validation(format!(
            "Limit must be between 1 and {MAX_SUGGESTION_LIMIT}"
        )));
    }

    require_user(&state.pool, user_id).await?;

    let source = PgSuggestionSource::new(state.pool.clone());
    let suggestions = suggest_for_user(&source, user_id, limit).await?;
    Ok(Json(SuggestionsResponse { suggestions }))
}
