//! # HTTP API
//!
//! JSON REST surface over axum. User-scoped routes live under
//! `/api/users/:user_id` and answer 404 for unknown users.
//!
//! Handlers validate their input before touching the database, so malformed
//! requests are rejected without a round trip.

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use sqlx::postgres::PgPool;
use std::sync::Arc;
use tracing::info;

use crate::ai::GeminiClient;
use crate::config::AppConfig;
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::models::User;
use crate::openfoodfacts::OpenFoodFactsClient;

mod favorites;
mod ingredients;
mod inventory;
mod products;
mod receipts;
mod recipes;
mod shopping_list;
mod suggestions;
mod users;

/// Multipart framing on top of the image itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    /// `None` when no Gemini API key is configured
    pub gemini: Option<Arc<GeminiClient>>,
    pub products: Arc<OpenFoodFactsClient>,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig) -> Result<Self> {
        let gemini = config
            .gemini
            .clone()
            .map(|gemini| Arc::new(GeminiClient::new(gemini, config.recovery.clone())));

        match &gemini {
            Some(client) => info!(model = client.model(), "AI features enabled"),
            None => info!("GEMINI_API_KEY not set, AI features disabled"),
        }

        let products = Arc::new(OpenFoodFactsClient::new(
            config.openfoodfacts_base_url.clone(),
            config.recovery.clone(),
        )?);

        Ok(Self {
            pool,
            config: Arc::new(config),
            gemini,
            products,
        })
    }

    pub(crate) fn gemini(&self) -> AppResult<&GeminiClient> {
        self.gemini
            .as_deref()
            .ok_or_else(|| AppError::Unavailable("AI features are not configured".to_string()))
    }
}

/// Resolve the user a request is scoped to
pub(crate) async fn require_user(pool: &PgPool, user_id: i64) -> AppResult<User> {
    db::get_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.config.upload.max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health))
        .route("/api/users", post(users::create_user))
        .route("/api/users/:user_id", get(users::get_user))
        .route("/api/ingredients", get(ingredients::search_ingredients))
        .route("/api/ingredients/:ingredient_id", get(ingredients::get_ingredient))
        .route(
            "/api/ingredients/:ingredient_id/barcode",
            put(ingredients::set_barcode),
        )
        .route(
            "/api/users/:user_id/inventory",
            get(inventory::list_inventory).post(inventory::add_item),
        )
        .route(
            "/api/users/:user_id/inventory/expiring",
            get(inventory::list_expiring),
        )
        .route("/api/users/:user_id/inventory/bulk", post(inventory::add_items))
        .route(
            "/api/users/:user_id/inventory/:item_id",
            put(inventory::update_item).delete(inventory::delete_item),
        )
        .route("/api/recipes", get(recipes::list_recipes))
        .route("/api/recipes/:recipe_id", get(recipes::get_recipe))
        .route("/api/users/:user_id/recipes", post(recipes::create_recipe))
        .route(
            "/api/users/:user_id/recipes/generate",
            post(receipts::generate_recipe),
        )
        .route(
            "/api/users/:user_id/recipes/:recipe_id",
            put(recipes::update_recipe).delete(recipes::delete_recipe),
        )
        .route("/api/users/:user_id/favorites", get(favorites::list_favorites))
        .route(
            "/api/users/:user_id/favorites/:recipe_id",
            put(favorites::add_favorite).delete(favorites::remove_favorite),
        )
        .route(
            "/api/users/:user_id/suggestions",
            get(suggestions::get_suggestions),
        )
        .route(
            "/api/users/:user_id/shopping-list",
            get(shopping_list::list_items).post(shopping_list::add_item),
        )
        .route(
            "/api/users/:user_id/shopping-list/checked",
            delete(shopping_list::clear_checked),
        )
        .route(
            "/api/users/:user_id/shopping-list/from-recipe/:recipe_id",
            post(shopping_list::add_from_recipe),
        )
        .route(
            "/api/users/:user_id/shopping-list/:item_id",
            patch(shopping_list::update_item).delete(shopping_list::delete_item),
        )
        .route("/api/users/:user_id/receipts", post(receipts::scan_receipt))
        .route("/api/products/:barcode", get(products::lookup_product))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
