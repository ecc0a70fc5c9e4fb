//! # Recipe Suggestion Engine
//!
//! Ranks recipes by how completely they can be cooked from what a user
//! currently holds in their fridge.
//!
//! ## Rules
//!
//! - An empty inventory yields no suggestions at all
//! - Favorites are always included, carrying their real score
//! - Other recipes need at least one ingredient on hand and are ranked by
//!   compatibility score, highest first
//! - Equal scores keep catalog order
//!
//! Inventory membership is boolean: quantities are never compared against
//! what a recipe asks for.
//!
//! ## Usage
//!
//! ```rust
//! use std::collections::HashSet;
//! use fridgechef::suggestion::{suggest_recipes, RecipeRequirements, DEFAULT_RESULT_LIMIT};
//!
//! struct Dish(i64, Vec<i64>);
//!
//! impl RecipeRequirements for Dish {
//!     fn recipe_id(&self) -> i64 {
//!         self.0
//!     }
//!
//!     fn required_ingredient_ids(&self) -> impl Iterator<Item = i64> + '_ {
//!         self.1.iter().copied()
//!     }
//! }
//!
//! let inventory: HashSet<i64> = [1, 2].into_iter().collect();
//! let catalog = vec![Dish(10, vec![1, 2, 3]), Dish(11, vec![1])];
//!
//! let suggestions = suggest_recipes(&inventory, catalog, &HashSet::new(), DEFAULT_RESULT_LIMIT);
//! assert_eq!(suggestions[0].recipe.0, 11);
//! assert_eq!(suggestions[0].compatibility_score, 100);
//! assert_eq!(suggestions[1].compatibility_score, 67);
//! ```

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Identifier of a kind of ingredient
pub type IngredientId = i64;

/// Identifier of a recipe
pub type RecipeId = i64;

/// Number of suggestions returned when the caller does not ask otherwise
pub const DEFAULT_RESULT_LIMIT: usize = 10;

/// What the engine needs to know about a recipe
pub trait RecipeRequirements {
    /// The recipe identifier, matched against the favorite set
    fn recipe_id(&self) -> RecipeId;

    /// Every required ingredient reference, duplicates included
    fn required_ingredient_ids(&self) -> impl Iterator<Item = IngredientId> + '_;
}

impl<R: RecipeRequirements + ?Sized> RecipeRequirements for &R {
    fn recipe_id(&self) -> RecipeId {
        (**self).recipe_id()
    }

    fn required_ingredient_ids(&self) -> impl Iterator<Item = IngredientId> + '_ {
        (**self).required_ingredient_ids()
    }
}

/// Ingredient coverage of one recipe against an inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compatibility {
    /// Required references present in the inventory
    pub available: usize,
    /// Required references, not deduplicated
    pub total: usize,
}

impl Compatibility {
    /// Count how many of the recipe's required ingredients are on hand
    pub fn assess<R: RecipeRequirements + ?Sized>(
        recipe: &R,
        inventory: &HashSet<IngredientId>,
    ) -> Self {
        let mut available = 0;
        let mut total = 0;
        for ingredient_id in recipe.required_ingredient_ids() {
            total += 1;
            if inventory.contains(&ingredient_id) {
                available += 1;
            }
        }
        Self { available, total }
    }

    /// Percentage of required ingredients on hand, rounded half-up
    ///
    /// A recipe without requirements scores 0.
    pub fn score(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let rounded = (200 * self.available + self.total) / (2 * self.total);
        rounded.min(100) as u8
    }

    /// Required ingredients the user does not have
    pub fn missing(&self) -> usize {
        self.total - self.available
    }
}

/// A ranked recipe with its coverage annotations
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion<R> {
    #[serde(flatten)]
    pub recipe: R,
    pub compatibility_score: u8,
    pub missing_ingredients_count: usize,
    pub is_favorite: bool,
}

impl<R> Suggestion<R> {
    fn new(recipe: R, compatibility: Compatibility, is_favorite: bool) -> Self {
        Self {
            recipe,
            compatibility_score: compatibility.score(),
            missing_ingredients_count: compatibility.missing(),
            is_favorite,
        }
    }
}

/// Rank `catalog` against `inventory`, favorites first
///
/// Returns at most `result_limit` suggestions. Favorites come first in
/// catalog order, followed by the best scoring non-favorites that share at
/// least one ingredient with the inventory.
pub fn suggest_recipes<R, I>(
    inventory: &HashSet<IngredientId>,
    catalog: I,
    favorite_recipe_ids: &HashSet<RecipeId>,
    result_limit: usize,
) -> Vec<Suggestion<R>>
where
    R: RecipeRequirements,
    I: IntoIterator<Item = R>,
{
    if inventory.is_empty() {
        debug!("Empty inventory, no suggestions");
        return Vec::new();
    }

    let mut favorites = Vec::new();
    let mut candidates = Vec::new();

    for recipe in catalog {
        let compatibility = Compatibility::assess(&recipe, inventory);
        let is_favorite = favorite_recipe_ids.contains(&recipe.recipe_id());

        if is_favorite {
            favorites.push(Suggestion::new(recipe, compatibility, true));
        } else if compatibility.score() > 0 {
            candidates.push(Suggestion::new(recipe, compatibility, false));
        }
    }

    // sort_by is stable: ties keep catalog order
    candidates.sort_by(|a, b| b.compatibility_score.cmp(&a.compatibility_score));

    debug!(
        favorites = favorites.len(),
        candidates = candidates.len(),
        result_limit,
        "Ranking suggestions"
    );

    let open_slots = result_limit.saturating_sub(favorites.len());
    let mut suggestions = favorites;
    suggestions.extend(candidates.into_iter().take(open_slots));
    suggestions.truncate(result_limit);
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestRecipe {
        id: RecipeId,
        ingredients: Vec<IngredientId>,
    }

    impl RecipeRequirements for TestRecipe {
        fn recipe_id(&self) -> RecipeId {
            self.id
        }

        fn required_ingredient_ids(&self) -> impl Iterator<Item = IngredientId> + '_ {
            self.ingredients.iter().copied()
        }
    }

    const TOMATO: IngredientId = 1;
    const ONION: IngredientId = 2;
    const GARLIC: IngredientId = 3;
    const LEEK: IngredientId = 4;
    const CHICKEN: IngredientId = 5;
    const RICE: IngredientId = 6;

    fn recipe(id: RecipeId, ingredients: &[IngredientId]) -> TestRecipe {
        TestRecipe {
            id,
            ingredients: ingredients.to_vec(),
        }
    }

    fn set(ids: &[i64]) -> HashSet<i64> {
        ids.iter().copied().collect()
    }

    fn ids<R: RecipeRequirements>(suggestions: &[Suggestion<R>]) -> Vec<RecipeId> {
        suggestions.iter().map(|s| s.recipe.recipe_id()).collect()
    }

    #[test]
    fn test_empty_inventory_returns_nothing() {
        let catalog = vec![recipe(1, &[TOMATO]), recipe(2, &[])];
        let favorites = set(&[1, 2]);

        let result = suggest_recipes(&HashSet::new(), catalog, &favorites, 10);

        assert!(result.is_empty());
    }

    #[test]
    fn test_ranks_by_score_descending() {
        let inventory = set(&[TOMATO, ONION]);
        let catalog = vec![recipe(1, &[TOMATO, ONION, GARLIC]), recipe(2, &[TOMATO])];

        let result = suggest_recipes(&inventory, catalog, &HashSet::new(), 10);

        assert_eq!(ids(&result), vec![2, 1]);
        assert_eq!(result[0].compatibility_score, 100);
        assert_eq!(result[0].missing_ingredients_count, 0);
        assert_eq!(result[1].compatibility_score, 67);
        assert_eq!(result[1].missing_ingredients_count, 1);
        assert!(result.iter().all(|s| !s.is_favorite));
    }

    #[test]
    fn test_zero_score_non_favorite_excluded() {
        let inventory = set(&[TOMATO]);
        let catalog = vec![recipe(3, &[GARLIC, LEEK])];

        let result = suggest_recipes(&inventory, catalog, &HashSet::new(), 10);

        assert!(result.is_empty());
    }

    #[test]
    fn test_zero_score_favorite_included() {
        let inventory = set(&[TOMATO]);
        let catalog = vec![recipe(4, &[CHICKEN])];

        let result = suggest_recipes(&inventory, catalog, &set(&[4]), 10);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].recipe.id, 4);
        assert_eq!(result[0].compatibility_score, 0);
        assert_eq!(result[0].missing_ingredients_count, 1);
        assert!(result[0].is_favorite);
    }

    #[test]
    fn test_limit_keeps_top_scores() {
        let inventory = set(&[RICE]);
        // Recipe n needs rice plus n-1 other ingredients, so scores fall with n
        let catalog: Vec<TestRecipe> = (1..=12)
            .map(|n| {
                let mut ingredients = vec![RICE];
                ingredients.extend((0..n - 1).map(|k| 100 + k));
                recipe(n, &ingredients)
            })
            .collect();

        let result = suggest_recipes(&inventory, catalog, &HashSet::new(), 10);

        assert_eq!(result.len(), 10);
        assert_eq!(ids(&result), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_favorites_come_first_with_true_score() {
        let inventory = set(&[TOMATO, ONION]);
        let catalog = vec![
            recipe(1, &[TOMATO]),
            recipe(2, &[TOMATO, GARLIC]),
            recipe(3, &[ONION]),
        ];

        let result = suggest_recipes(&inventory, catalog, &set(&[2]), 10);

        assert_eq!(ids(&result), vec![2, 1, 3]);
        assert!(result[0].is_favorite);
        assert_eq!(result[0].compatibility_score, 50);
    }

    #[test]
    fn test_favorites_reduce_open_slots() {
        let inventory = set(&[TOMATO]);
        let catalog = vec![
            recipe(1, &[TOMATO]),
            recipe(2, &[TOMATO]),
            recipe(3, &[CHICKEN]),
            recipe(4, &[TOMATO, GARLIC]),
        ];

        let result = suggest_recipes(&inventory, catalog, &set(&[3]), 2);

        assert_eq!(ids(&result), vec![3, 1]);
    }

    #[test]
    fn test_more_favorites_than_limit_truncates() {
        let inventory = set(&[TOMATO]);
        let catalog = vec![recipe(1, &[TOMATO]), recipe(2, &[ONION]), recipe(3, &[LEEK])];

        let result = suggest_recipes(&inventory, catalog, &set(&[1, 2, 3]), 2);

        assert_eq!(ids(&result), vec![1, 2]);
    }

    #[test]
    fn test_zero_limit_returns_nothing() {
        let inventory = set(&[TOMATO]);
        let catalog = vec![recipe(1, &[TOMATO])];

        let result = suggest_recipes(&inventory, catalog, &set(&[1]), 0);

        assert!(result.is_empty());
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let inventory = set(&[TOMATO, ONION]);
        let catalog = vec![
            recipe(7, &[TOMATO, GARLIC]),
            recipe(3, &[ONION, LEEK]),
            recipe(5, &[TOMATO]),
            recipe(1, &[CHICKEN, ONION]),
        ];

        let result = suggest_recipes(&inventory, catalog, &HashSet::new(), 10);

        assert_eq!(ids(&result), vec![5, 7, 3, 1]);
    }

    #[test]
    fn test_recipe_without_ingredients() {
        let inventory = set(&[TOMATO]);
        let empty = recipe(9, &[]);

        let compatibility = Compatibility::assess(&empty, &inventory);
        assert_eq!(compatibility.score(), 0);
        assert_eq!(compatibility.missing(), 0);

        let not_favorite = suggest_recipes(&inventory, vec![empty.clone()], &HashSet::new(), 10);
        assert!(not_favorite.is_empty());

        let favorite = suggest_recipes(&inventory, vec![empty], &set(&[9]), 10);
        assert_eq!(favorite.len(), 1);
        assert_eq!(favorite[0].compatibility_score, 0);
    }

    #[test]
    fn test_duplicate_requirements_count_twice() {
        let inventory = set(&[TOMATO]);
        let doubled = recipe(1, &[TOMATO, TOMATO, GARLIC]);

        let compatibility = Compatibility::assess(&doubled, &inventory);

        assert_eq!(compatibility.available, 2);
        assert_eq!(compatibility.total, 3);
        assert_eq!(compatibility.score(), 67);
    }

    #[test]
    fn test_score_rounds_half_up() {
        let half = Compatibility {
            available: 1,
            total: 8,
        };
        assert_eq!(half.score(), 13);

        let third = Compatibility {
            available: 1,
            total: 3,
        };
        assert_eq!(third.score(), 33);

        let full = Compatibility {
            available: 4,
            total: 4,
        };
        assert_eq!(full.score(), 100);
    }

    #[test]
    fn test_borrowed_catalog() {
        let inventory = set(&[TOMATO]);
        let catalog = vec![recipe(1, &[TOMATO]), recipe(2, &[ONION])];

        let result = suggest_recipes(&inventory, catalog.iter(), &HashSet::new(), 10);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].recipe, &catalog[0]);
        // Input snapshot is untouched
        assert_eq!(catalog.len(), 2);
    }
}
