//! # Database Module
//!
//! PostgreSQL persistence through sqlx. Every function takes the pool (or a
//! transaction) explicitly; nothing here holds global state.
//!
//! Conventions:
//! - `create_*` / `add_*` return the new row id
//! - `read_*` / `get_*` return `Option`
//! - `update_*` / `delete_*` return `false` when no row matched, which is
//!   also what a user-scoped call on someone else's row reports

use anyhow::{Context, Result};
use sqlx::postgres::PgPool;
use tracing::{debug, info};

use crate::models::User;

pub mod favorites;
pub mod ingredients;
pub mod inventory;
pub mod recipes;
pub mod shopping_list;

pub use favorites::*;
pub use ingredients::*;
pub use inventory::*;
pub use recipes::*;
pub use shopping_list::*;

const SCHEMA: &[(&str, &str)] = &[
    (
        "users",
        "CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    ),
    (
        "ingredients",
        "CREATE TABLE IF NOT EXISTS ingredients (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            category TEXT,
            barcode TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    ),
    (
        "inventory_items",
        "CREATE TABLE IF NOT EXISTS inventory_items (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            ingredient_id BIGINT NOT NULL REFERENCES ingredients(id),
            quantity DOUBLE PRECISION NOT NULL CHECK (quantity >= 0),
            unit TEXT,
            expiry_date DATE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    ),
    (
        "recipes",
        "CREATE TABLE IF NOT EXISTS recipes (
            id BIGSERIAL PRIMARY KEY,
            author_id BIGINT REFERENCES users(id) ON DELETE SET NULL,
            title TEXT NOT NULL,
            description TEXT,
            instructions TEXT NOT NULL,
            prep_time_minutes INTEGER,
            servings INTEGER,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    ),
    (
        "recipe_ingredients",
        "CREATE TABLE IF NOT EXISTS recipe_ingredients (
            id BIGSERIAL PRIMARY KEY,
            recipe_id BIGINT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            ingredient_id BIGINT NOT NULL REFERENCES ingredients(id),
            quantity DOUBLE PRECISION,
            unit TEXT,
            position INTEGER NOT NULL DEFAULT 0
        )",
    ),
    (
        "favorites",
        "CREATE TABLE IF NOT EXISTS favorites (
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            recipe_id BIGINT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (user_id, recipe_id)
        )",
    ),
    (
        "shopping_list_items",
        "CREATE TABLE IF NOT EXISTS shopping_list_items (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            ingredient_id BIGINT REFERENCES ingredients(id) ON DELETE SET NULL,
            name TEXT NOT NULL,
            quantity DOUBLE PRECISION,
            unit TEXT,
            checked BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    ),
    (
        "inventory index",
        "CREATE INDEX IF NOT EXISTS idx_inventory_user ON inventory_items(user_id)",
    ),
    (
        "recipe ingredient index",
        "CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_recipe ON recipe_ingredients(recipe_id)",
    ),
    (
        "shopping list index",
        "CREATE INDEX IF NOT EXISTS idx_shopping_list_user ON shopping_list_items(user_id)",
    ),
];

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema...");

    for &(name, statement) in SCHEMA {
        debug!(object = name, "Creating schema object");
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create {name}"))?;
    }

    info!("Database schema initialized successfully");
    Ok(())
}

/// Escape `%`, `_` and `\` so user text matches literally inside LIKE
pub(crate) fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Substring pattern for ILIKE
pub(crate) fn like_pattern(text: &str) -> String {
    format!("%{}%", escape_like(text))
}

/// Create a new user, returning its id
pub async fn create_user(pool: &PgPool, username: &str) -> Result<i64> {
    info!(username, "Creating new user");

    let user_id: i64 = sqlx::query_scalar("INSERT INTO users (username) VALUES ($1) RETURNING id")
        .bind(username)
        .fetch_one(pool)
        .await
        .context("Failed to insert new user")?;

    info!(user_id, "User created");
    Ok(user_id)
}

/// Fetch the user with this username, creating it if needed
pub async fn get_or_create_user(pool: &PgPool, username: &str) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (username) VALUES ($1)
         ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username
         RETURNING id, username, created_at",
    )
    .bind(username)
    .fetch_one(pool)
    .await
    .context("Failed to get or create user")?;

    debug!(user_id = user.id, "Resolved user");
    Ok(user)
}

pub async fn get_user_by_id(pool: &PgPool, user_id: i64) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT id, username, created_at FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to read user")
}

pub async fn get_user_by_username(pool: &PgPool, username: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT id, username, created_at FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
        .context("Failed to read user by username")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_plain() {
        assert_eq!(like_pattern("tomato"), "%tomato%");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("100%_pure"), "%100\\%\\_pure%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_schema_creates_every_table() {
        let tables: Vec<&str> = SCHEMA
            .iter()
            .filter(|(_, sql)| sql.starts_with("CREATE TABLE"))
            .map(|(name, _)| *name)
            .collect();

        assert_eq!(
            tables,
            vec![
                "users",
                "ingredients",
                "inventory_items",
                "recipes",
                "recipe_ingredients",
                "favorites",
                "shopping_list_items",
            ]
        );
    }
}
