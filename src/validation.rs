//! Input validation for API payloads.
//!
//! Every validator trims its input and returns the cleaned value, or an
//! [`AppError::Validation`] naming the offending field.

use crate::errors::{AppError, AppResult};
use crate::models::{
    InventoryItemUpdate, NewInventoryItem, NewRecipe, NewRecipeIngredient, NewShoppingItem,
};

pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_UNIT_LENGTH: usize = 20;
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;
pub const MAX_INSTRUCTIONS_LENGTH: usize = 20000;
pub const MAX_RECIPE_INGREDIENTS: usize = 100;
pub const MAX_SERVINGS: i32 = 100;
pub const MAX_PREP_TIME_MINUTES: i32 = 24 * 60;
pub const MAX_EXPIRING_WINDOW_DAYS: i32 = 365;

fn invalid(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}

/// Validates a recipe title
pub fn validate_recipe_title(title: &str) -> AppResult<String> {
    let trimmed = title.trim();

    if trimmed.is_empty() {
        return Err(invalid("Recipe title cannot be empty"));
    }

    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(invalid(format!(
            "Recipe title cannot exceed {MAX_TITLE_LENGTH} characters"
        )));
    }

    Ok(trimmed.to_string())
}

/// Validates an ingredient or shopping item name
pub fn validate_name(field: &str, name: &str) -> AppResult<String> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(invalid(format!("{field} cannot be empty")));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(invalid(format!(
            "{field} cannot exceed {MAX_NAME_LENGTH} characters"
        )));
    }

    Ok(trimmed.to_string())
}

/// Quantities must be finite and strictly positive
pub fn validate_quantity(quantity: f64) -> AppResult<f64> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(invalid("Quantity must be a positive number"));
    }
    Ok(quantity)
}

pub fn validate_optional_quantity(quantity: Option<f64>) -> AppResult<Option<f64>> {
    quantity.map(validate_quantity).transpose()
}

/// Blank units become `None`
pub fn validate_unit(unit: Option<&str>) -> AppResult<Option<String>> {
    let Some(unit) = unit.map(str::trim).filter(|u| !u.is_empty()) else {
        return Ok(None);
    };

    if unit.chars().count() > MAX_UNIT_LENGTH {
        return Err(invalid(format!(
            "Unit cannot exceed {MAX_UNIT_LENGTH} characters"
        )));
    }

    Ok(Some(unit.to_string()))
}

fn validate_optional_text(field: &str, text: Option<&str>, max: usize) -> AppResult<Option<String>> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    if text.chars().count() > max {
        return Err(invalid(format!("{field} cannot exceed {max} characters")));
    }

    Ok(Some(text.to_string()))
}

pub fn validate_servings(servings: Option<i32>) -> AppResult<Option<i32>> {
    match servings {
        Some(s) if !(1..=MAX_SERVINGS).contains(&s) => Err(invalid(format!(
            "Servings must be between 1 and {MAX_SERVINGS}"
        ))),
        other => Ok(other),
    }
}

pub fn validate_prep_time(minutes: Option<i32>) -> AppResult<Option<i32>> {
    match minutes {
        Some(m) if !(0..=MAX_PREP_TIME_MINUTES).contains(&m) => Err(invalid(format!(
            "Preparation time must be between 0 and {MAX_PREP_TIME_MINUTES} minutes"
        ))),
        other => Ok(other),
    }
}

/// Barcodes are EAN-8 to GTIN-14: 8 to 14 ASCII digits
pub fn validate_barcode(barcode: &str) -> AppResult<String> {
    let trimmed = barcode.trim();

    if !(8..=14).contains(&trimmed.len()) || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("Barcode must be 8 to 14 digits"));
    }

    Ok(trimmed.to_string())
}

/// Usernames are 3 to 50 characters of letters, digits, `_` and `-`
pub fn validate_username(username: &str) -> AppResult<String> {
    let trimmed = username.trim();

    if !(3..=50).contains(&trimmed.len()) {
        return Err(invalid("Username must be 3 to 50 characters long"));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(invalid(
            "Username may only contain letters, digits, '_' and '-'",
        ));
    }

    Ok(trimmed.to_string())
}

pub fn validate_expiring_window(days: i32) -> AppResult<i32> {
    if !(0..=MAX_EXPIRING_WINDOW_DAYS).contains(&days) {
        return Err(invalid(format!(
            "Days must be between 0 and {MAX_EXPIRING_WINDOW_DAYS}"
        )));
    }
    Ok(days)
}

/// Validate and clean a new inventory item
pub fn validate_new_inventory_item(item: &NewInventoryItem) -> AppResult<NewInventoryItem> {
    Ok(NewInventoryItem {
        ingredient_name: validate_name("Ingredient name", &item.ingredient_name)?,
        category: validate_optional_text("Category", item.category.as_deref(), MAX_NAME_LENGTH)?,
        quantity: validate_quantity(item.quantity)?,
        unit: validate_unit(item.unit.as_deref())?,
        expiry_date: item.expiry_date,
    })
}

pub fn validate_inventory_update(update: &InventoryItemUpdate) -> AppResult<InventoryItemUpdate> {
    Ok(InventoryItemUpdate {
        quantity: validate_quantity(update.quantity)?,
        unit: validate_unit(update.unit.as_deref())?,
        expiry_date: update.expiry_date,
    })
}

/// Validate and clean a recipe payload
pub fn validate_new_recipe(recipe: &NewRecipe) -> AppResult<NewRecipe> {
    if recipe.ingredients.is_empty() {
        return Err(invalid("A recipe needs at least one ingredient"));
    }

    if recipe.ingredients.len() > MAX_RECIPE_INGREDIENTS {
        return Err(invalid(format!(
            "A recipe cannot have more than {MAX_RECIPE_INGREDIENTS} ingredients"
        )));
    }

    let instructions = recipe.instructions.trim();
    if instructions.is_empty() {
        return Err(invalid("Instructions cannot be empty"));
    }
    if instructions.chars().count() > MAX_INSTRUCTIONS_LENGTH {
        return Err(invalid(format!(
            "Instructions cannot exceed {MAX_INSTRUCTIONS_LENGTH} characters"
        )));
    }

    let ingredients = recipe
        .ingredients
        .iter()
        .map(|line| {
            Ok(NewRecipeIngredient {
                name: validate_name("Ingredient name", &line.name)?,
                quantity: validate_optional_quantity(line.quantity)?,
                unit: validate_unit(line.unit.as_deref())?,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(NewRecipe {
        title: validate_recipe_title(&recipe.title)?,
        description: validate_optional_text(
            "Description",
            recipe.description.as_deref(),
            MAX_DESCRIPTION_LENGTH,
        )?,
        instructions: instructions.to_string(),
        prep_time_minutes: validate_prep_time(recipe.prep_time_minutes)?,
        servings: validate_servings(recipe.servings)?,
        ingredients,
    })
}

pub fn validate_new_shopping_item(item: &NewShoppingItem) -> AppResult<NewShoppingItem> {
    Ok(NewShoppingItem {
        name: validate_name("Item name", &item.name)?,
        quantity: validate_optional_quantity(item.quantity)?,
        unit: validate_unit(item.unit.as_deref())?,
    })
}
