//! # Domain Model
//!
//! Records read from the database and payloads accepted by the API. All of
//! them serialise with camelCase field names.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::suggestion::{IngredientId, RecipeId, RecipeRequirements};

/// A user of the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// A kind of ingredient, unique by normalised name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub category: Option<String>,
    /// Barcode of a packaged product known to contain this ingredient
    pub barcode: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Something a user has in their fridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: i64,
    pub user_id: i64,
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,
    pub quantity: f64,
    pub unit: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Recipe header without its ingredient lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: RecipeId,
    /// `None` for catalog recipes nobody owns
    pub author_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub instructions: String,
    pub prep_time_minutes: Option<i32>,
    pub servings: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// One ingredient line of a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredientLine {
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

/// Recipe with its ingredient lines, in recipe order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeWithIngredients {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeIngredientLine>,
}

impl RecipeRequirements for RecipeWithIngredients {
    fn recipe_id(&self) -> RecipeId {
        self.recipe.id
    }

    fn required_ingredient_ids(&self) -> impl Iterator<Item = IngredientId> + '_ {
        self.ingredients.iter().map(|line| line.ingredient_id)
    }
}

/// A favorite recipe with the time it was marked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecipe {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub recipe: Recipe,
    pub favorited_at: DateTime<Utc>,
}

/// An entry on a user's shopping list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListItem {
    pub id: i64,
    pub user_id: i64,
    /// Linked when the name matches a known ingredient
    pub ingredient_id: Option<IngredientId>,
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub checked: bool,
    pub created_at: DateTime<Utc>,
}

// Request payloads

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    pub ingredient_name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub quantity: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

/// Full replacement of an inventory item's amount and expiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemUpdate {
    pub quantity: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecipeIngredient {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Recipe payload, used for both creation and replacement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecipe {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub instructions: String,
    #[serde(default)]
    pub prep_time_minutes: Option<i32>,
    #[serde(default)]
    pub servings: Option<i32>,
    pub ingredients: Vec<NewRecipeIngredient>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShoppingItem {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItemUpdate {
    pub checked: bool,
}
