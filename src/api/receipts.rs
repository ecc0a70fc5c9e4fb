//! AI backed routes: receipt scanning and recipe generation.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{require_user, AppState};
use crate::ai::{GeneratedRecipe, ReceiptItem};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::models::NewRecipe;
use crate::suggestion::RecipeId;
use crate::upload::validate_receipt_image;
use crate::validation::{validate_name, validate_new_recipe};

const RECEIPT_FIELD: &str = "receipt";
const MAX_PREFERENCES_LENGTH: usize = 500;

#[derive(Debug, Serialize)]
pub struct ReceiptScan {
    /// Extracted items for the user to confirm; nothing is stored yet
    pub items: Vec<ReceiptItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Ingredient names; the user's inventory when absent
    pub ingredients: Option<Vec<String>>,
    pub preferences: Option<String>,
    /// Store the generated recipe under the user's name
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub recipe: GeneratedRecipe,
    pub saved_recipe_id: Option<RecipeId>,
}

/// Read the food items off an uploaded receipt photo
pub async fn scan_receipt(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    mut multipart: Multipart,
) -> AppResult<Json<ReceiptScan>> {
    let gemini = state.gemini()?;

    let mut receipt = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        if field.name() == Some(RECEIPT_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
            receipt = Some(bytes);
            break;
        }
    }

    let bytes = receipt.ok_or_else(|| {
        AppError::Validation(format!("Missing multipart field '{RECEIPT_FIELD}'"))
    })?;
    let image = validate_receipt_image(&bytes, &state.config.upload)?;

    require_user(&state.pool, user_id).await?;

    let items = gemini.extract_receipt_items(&bytes, image.mime_type).await?;
    info!(user_id, items = items.len(), "Receipt scanned");
    Ok(Json(ReceiptScan { items }))
}

/// Ask the AI for a recipe, from given ingredients or the user's inventory
pub async fn generate_recipe(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(payload): Json<GenerateRequest>,
) -> AppResult<(StatusCode, Json<GenerateResponse>)> {
    let gemini = state.gemini()?;

    let preferences = payload
        .preferences
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());
    if preferences.is_some_and(|p| p.chars().count() > MAX_PREFERENCES_LENGTH) {
        return Err(AppError::Validation(format!(
            "Preferences cannot exceed {MAX_PREFERENCES_LENGTH} characters"
        )));
    }

    let requested = payload
        .ingredients
        .as_deref()
        .map(|names| {
            names
                .iter()
                .map(|name| validate_name("Ingredient name", name))
                .collect::<AppResult<Vec<_>>>()
        })
        .transpose()?;

    require_user(&state.pool, user_id).await?;

    let ingredients = match requested {
        Some(names) => names,
        None => db::inventory_ingredient_names(&state.pool, user_id).await?,
    };
    if ingredients.is_empty() {
        return Err(AppError::Validation(
            "No ingredients to cook with".to_string(),
        ));
    }

    let recipe = gemini.generate_recipe(&ingredients, preferences).await?;

    if !payload.save {
        return Ok((
            StatusCode::OK,
            Json(GenerateResponse {
                recipe,
                saved_recipe_id: None,
            }),
        ));
    }

    let new_recipe = validate_new_recipe(&NewRecipe::from(recipe.clone()))
        .map_err(|e| AppError::Upstream(format!("Generated recipe cannot be stored: {e}")))?;
    let recipe_id = db::create_recipe(&state.pool, Some(user_id), &new_recipe).await?;

    Ok((
        StatusCode::CREATED,
        Json(GenerateResponse {
            recipe,
            saved_recipe_id: Some(recipe_id),
        }),
    ))
}
