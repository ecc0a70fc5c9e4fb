//! # Ingredient Name Normalisation
//!
//! Ingredient rows are unique by normalised name, so "  Red Onion," and
//! "red onion" resolve to the same ingredient. Receipt lines often carry a
//! leading count or weight ("2 x Milk", "500g Flour"), which is stripped
//! before normalising.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("Whitespace pattern should be valid");
    static ref LEADING_QUANTITY: Regex = Regex::new(
        r"(?i)^\s*\d+(?:[.,]\d+)?(?:\s*(?:x\b|×|kg\b|g\b|mg\b|l\b|cl\b|ml\b|lb\b|lbs\b|oz\b|pcs?\b|pk\b)\s*|\s+)"
    )
    .expect("Leading quantity pattern should be valid");
}

/// Trim, lowercase, collapse whitespace and strip surrounding punctuation
///
/// # Examples
///
/// ```rust
/// use fridgechef::ingredient_names::normalize_ingredient_name;
///
/// assert_eq!(normalize_ingredient_name("  Red   Onion, "), "red onion");
/// ```
pub fn normalize_ingredient_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let trimmed = lowered.trim_matches(|c: char| {
        c.is_whitespace() || (c.is_ascii_punctuation() && c != '%' && c != '&')
    });
    WHITESPACE.replace_all(trimmed, " ").into_owned()
}

/// Remove a leading count or weight such as "2 x" or "500g"
///
/// The number must be followed by a unit or whitespace, so names that start
/// with digits ("7up") survive. Lines made only of a number are returned
/// unchanged.
pub fn strip_leading_quantity(line: &str) -> &str {
    match LEADING_QUANTITY.find(line) {
        Some(m) if m.end() < line.len() => &line[m.end()..],
        _ => line,
    }
}

/// Normalised name for a receipt line, `None` if nothing is left
pub fn receipt_line_to_name(line: &str) -> Option<String> {
    let name = normalize_ingredient_name(strip_leading_quantity(line));
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
