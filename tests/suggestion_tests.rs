//! Ranking properties over generated catalogs, and the JSON shape of a suggestion.

use chrono::{TimeZone, Utc};
use fridgechef::models::{Recipe, RecipeIngredientLine, RecipeWithIngredients};
use fridgechef::suggestion::{suggest_recipes, Compatibility, RecipeRequirements};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

fn catalog_recipe(id: i64, ingredient_ids: &[i64]) -> RecipeWithIngredients {
    RecipeWithIngredients {
        recipe: Recipe {
            id,
            author_id: None,
            title: format!("Recipe {id}"),
            description: None,
            instructions: "Cook.".to_string(),
            prep_time_minutes: None,
            servings: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        },
        ingredients: ingredient_ids
            .iter()
            .map(|&ingredient_id| RecipeIngredientLine {
                ingredient_id,
                ingredient_name: format!("ingredient {ingredient_id}"),
                quantity: None,
                unit: None,
            })
            .collect(),
    }
}

fn random_case(rng: &mut StdRng) -> (HashSet<i64>, Vec<RecipeWithIngredients>, HashSet<i64>, usize) {
    let inventory: HashSet<i64> = (0..rng.gen_range(0..8)).map(|_| rng.gen_range(1..15)).collect();

    let catalog: Vec<RecipeWithIngredients> = (1..=rng.gen_range(0..25))
        .map(|id| {
            let ingredients: Vec<i64> = (0..rng.gen_range(0..6)).map(|_| rng.gen_range(1..15)).collect();
            catalog_recipe(id, &ingredients)
        })
        .collect();

    let favorites: HashSet<i64> = catalog
        .iter()
        .map(|r| r.recipe.id)
        .filter(|_| rng.gen_bool(0.2))
        .collect();

    (inventory, catalog, favorites, rng.gen_range(0..15))
}

#[test]
fn test_ranking_properties_hold() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..500 {
        let (inventory, catalog, favorites, limit) = random_case(&mut rng);
        let result = suggest_recipes(&inventory, &catalog, &favorites, limit);

        assert!(result.len() <= limit);

        if inventory.is_empty() {
            assert!(result.is_empty());
            continue;
        }

        // Favorites lead, then non-favorites by descending score
        let split = result.iter().take_while(|s| s.is_favorite).count();
        assert!(result[split..].iter().all(|s| !s.is_favorite));
        assert!(result[split..]
            .windows(2)
            .all(|w| w[0].compatibility_score >= w[1].compatibility_score));
        assert!(result[split..].iter().all(|s| s.compatibility_score > 0));

        // Every favorite shows up exactly once while room remains
        let shown: Vec<i64> = result.iter().map(|s| s.recipe.recipe_id()).collect();
        if favorites.len() <= limit {
            for favorite in &favorites {
                assert_eq!(shown.iter().filter(|id| *id == favorite).count(), 1);
            }
        }

        for suggestion in &result {
            let required: Vec<i64> = suggestion.recipe.required_ingredient_ids().collect();
            let available = required.iter().filter(|id| inventory.contains(id)).count();
            let total = required.len();

            assert!(suggestion.compatibility_score <= 100);
            assert_eq!(suggestion.missing_ingredients_count + available, total);
            assert_eq!(
                suggestion.compatibility_score,
                Compatibility { available, total }.score()
            );
            if total > 0 {
                let expected = (100.0 * available as f64 / total as f64).round() as u8;
                assert_eq!(suggestion.compatibility_score, expected);
            }
        }
    }
}

#[test]
fn test_suggestion_serialises_flat_camel_case() {
    let inventory: HashSet<i64> = [1].into_iter().collect();
    let catalog = vec![catalog_recipe(42, &[1, 2])];

    let result = suggest_recipes(&inventory, catalog, &HashSet::new(), 10);
    let json = serde_json::to_value(&result[0]).unwrap();

    assert_eq!(json["id"], 42);
    assert_eq!(json["title"], "Recipe 42");
    assert_eq!(json["compatibilityScore"], 50);
    assert_eq!(json["missingIngredientsCount"], 1);
    assert_eq!(json["isFavorite"], false);
    assert_eq!(json["ingredients"][1]["ingredientId"], 2);
}
