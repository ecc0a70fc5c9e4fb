//! Recipe queries.
//!
//! A recipe and its ingredient lines are always written in one transaction.

use anyhow::{Context, Result};
use sqlx::postgres::{PgConnection, PgPool};
use sqlx::FromRow;
use std::collections::HashMap;
use tracing::info;

use super::ingredients::find_or_create_ingredient_with;
use crate::models::{NewRecipe, NewRecipeIngredient, Recipe, RecipeIngredientLine, RecipeWithIngredients};
use crate::suggestion::{IngredientId, RecipeId};

const RECIPE_COLUMNS: &str =
    "r.id, r.author_id, r.title, r.description, r.instructions, r.prep_time_minutes, r.servings, r.created_at";

#[derive(Debug, FromRow)]
struct CatalogLineRow {
    recipe_id: RecipeId,
    ingredient_id: IngredientId,
    ingredient_name: String,
    quantity: Option<f64>,
    unit: Option<String>,
}

async fn insert_recipe_lines(
    conn: &mut PgConnection,
    recipe_id: RecipeId,
    lines: &[NewRecipeIngredient],
) -> Result<()> {
    for (position, line) in lines.iter().enumerate() {
        let ingredient_id = find_or_create_ingredient_with(&mut *conn, &line.name, None).await?;

        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity, unit, position)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(recipe_id)
        .bind(ingredient_id)
        .bind(line.quantity)
        .bind(line.unit.as_deref())
        .bind(position as i32)
        .execute(&mut *conn)
        .await
        .context("Failed to insert recipe ingredient")?;
    }
    Ok(())
}

/// Create a recipe with its ingredient lines
pub async fn create_recipe(
    pool: &PgPool,
    author_id: Option<i64>,
    recipe: &NewRecipe,
) -> Result<RecipeId> {
    info!(?author_id, title = %recipe.title, "Creating recipe");

    let mut tx = pool.begin().await.context("Failed to start transaction")?;

    let recipe_id: RecipeId = sqlx::query_scalar(
        "INSERT INTO recipes (author_id, title, description, instructions, prep_time_minutes, servings)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id",
    )
    .bind(author_id)
    .bind(&recipe.title)
    .bind(recipe.description.as_deref())
    .bind(&recipe.instructions)
    .bind(recipe.prep_time_minutes)
    .bind(recipe.servings)
    .fetch_one(&mut *tx)
    .await
    .context("Failed to insert recipe")?;

    insert_recipe_lines(&mut tx, recipe_id, &recipe.ingredients).await?;

    tx.commit().await.context("Failed to commit recipe")?;

    info!(recipe_id, lines = recipe.ingredients.len(), "Recipe created");
    Ok(recipe_id)
}

/// Recipe header only
pub async fn read_recipe_header(pool: &PgPool, recipe_id: RecipeId) -> Result<Option<Recipe>> {
    sqlx::query_as::<_, Recipe>(&format!("SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.id = $1"))
        .bind(recipe_id)
        .fetch_optional(pool)
        .await
        .context("Failed to read recipe")
}

/// Recipe with its ingredient lines
pub async fn read_recipe(pool: &PgPool, recipe_id: RecipeId) -> Result<Option<RecipeWithIngredients>> {
    let Some(recipe) = read_recipe_header(pool, recipe_id).await? else {
        return Ok(None);
    };

    let ingredients = sqlx::query_as::<_, RecipeIngredientLine>(
        "SELECT ri.ingredient_id, i.name AS ingredient_name, ri.quantity, ri.unit
         FROM recipe_ingredients ri
         JOIN ingredients i ON i.id = ri.ingredient_id
         WHERE ri.recipe_id = $1
         ORDER BY ri.position, ri.id",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .context("Failed to read recipe ingredients")?;

    Ok(Some(RecipeWithIngredients {
        recipe,
        ingredients,
    }))
}

/// Most recent recipes first
pub async fn list_recipes(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Recipe>> {
    sqlx::query_as::<_, Recipe>(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes r ORDER BY r.created_at DESC, r.id DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list recipes")
}

/// Recipes whose title or any ingredient name contains `text`
pub async fn search_recipes(
    pool: &PgPool,
    text: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Recipe>> {
    sqlx::query_as::<_, Recipe>(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes r
         WHERE r.title ILIKE $1
            OR EXISTS (
                SELECT 1 FROM recipe_ingredients ri
                JOIN ingredients i ON i.id = ri.ingredient_id
                WHERE ri.recipe_id = r.id AND i.name ILIKE $1
            )
         ORDER BY r.title, r.id
         LIMIT $2 OFFSET $3"
    ))
    .bind(super::like_pattern(text.trim()))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to search recipes")
}

/// Every recipe with its ingredient lines, ordered by recipe id
///
/// This is the catalog snapshot fed to the suggestion engine.
pub async fn list_recipe_catalog(pool: &PgPool) -> Result<Vec<RecipeWithIngredients>> {
    let recipes = sqlx::query_as::<_, Recipe>(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes r ORDER BY r.id"
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list recipe catalog")?;

    let rows = sqlx::query_as::<_, CatalogLineRow>(
        "SELECT ri.recipe_id, ri.ingredient_id, i.name AS ingredient_name, ri.quantity, ri.unit
         FROM recipe_ingredients ri
         JOIN ingredients i ON i.id = ri.ingredient_id
         ORDER BY ri.recipe_id, ri.position, ri.id",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list recipe catalog ingredients")?;

    let mut lines: HashMap<RecipeId, Vec<RecipeIngredientLine>> = HashMap::new();
    for row in rows {
        lines.entry(row.recipe_id).or_default().push(RecipeIngredientLine {
            ingredient_id: row.ingredient_id,
            ingredient_name: row.ingredient_name,
            quantity: row.quantity,
            unit: row.unit,
        });
    }

    Ok(recipes
        .into_iter()
        .map(|recipe| {
            let ingredients = lines.remove(&recipe.id).unwrap_or_default();
            RecipeWithIngredients {
                recipe,
                ingredients,
            }
        })
        .collect())
}

/// Replace a recipe the user authored, lines included
pub async fn update_recipe(
    pool: &PgPool,
    recipe_id: RecipeId,
    author_id: i64,
    recipe: &NewRecipe,
) -> Result<bool> {
    info!(recipe_id, author_id, "Updating recipe");

    let mut tx = pool.begin().await.context("Failed to start transaction")?;

    let rows_affected = sqlx::query(
        "UPDATE recipes
         SET title = $1, description = $2, instructions = $3, prep_time_minutes = $4, servings = $5
         WHERE id = $6 AND author_id = $7",
    )
    .bind(&recipe.title)
    .bind(recipe.description.as_deref())
    .bind(&recipe.instructions)
    .bind(recipe.prep_time_minutes)
    .bind(recipe.servings)
    .bind(recipe_id)
    .bind(author_id)
    .execute(&mut *tx)
    .await
    .context("Failed to update recipe")?
    .rows_affected();

    if rows_affected == 0 {
        info!(recipe_id, author_id, "No recipe found for author");
        // Dropping the transaction rolls it back
        return Ok(false);
    }

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear recipe ingredients")?;

    insert_recipe_lines(&mut tx, recipe_id, &recipe.ingredients).await?;

    tx.commit().await.context("Failed to commit recipe update")?;

    info!(recipe_id, "Recipe updated");
    Ok(true)
}

/// Delete a recipe the user authored
pub async fn delete_recipe(pool: &PgPool, recipe_id: RecipeId, author_id: i64) -> Result<bool> {
    info!(recipe_id, author_id, "Deleting recipe");

    let rows_affected = sqlx::query("DELETE FROM recipes WHERE id = $1 AND author_id = $2")
        .bind(recipe_id)
        .bind(author_id)
        .execute(pool)
        .await
        .context("Failed to delete recipe")?
        .rows_affected();

    if rows_affected > 0 {
        info!(recipe_id, "Recipe deleted");
        Ok(true)
    } else {
        info!(recipe_id, author_id, "No recipe found for author");
        Ok(false)
    }
}
