//! # fridgechef
//!
//! Backend for a fridge inventory and recipe app: track what is in the
//! fridge, keep recipes and a shopping list, and get recipe suggestions
//! ranked by how much of each recipe can be cooked right now.
//!
//! The ranking itself lives in [`suggestion`] and is a pure function;
//! [`store`] feeds it from the database and [`api`] exposes it over HTTP.

pub mod ai;
pub mod api;
pub mod circuit_breaker;
pub mod config;
pub mod db;
pub mod errors;
pub mod ingredient_names;
pub mod logging;
pub mod models;
pub mod openfoodfacts;
pub mod retry;
pub mod store;
pub mod suggestion;
pub mod upload;
pub mod validation;
