use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::allergen::{extract_allergens, strip_disclosure};
use super::text::clean_text;
use crate::model::{Ingredient, Quantity};

/// Leading-anchored decomposition of one ingredient line: an optional
/// quantity token, an optional unit from the controlled vocabulary, and the
/// remainder as the name. Units must be followed by whitespace so that a
/// one-letter unit never swallows the first letter of a name ("1 gram" vs
/// "1 garlic clove").
static INGREDIENT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^\s*",
        r"(?:(?P<quantity>",
        r"[\d./]+(?:[\s-]\d/\d)?",
        r"|one|two|three|four|five|six|seven|eight|nine|ten",
        r"|a few|an?|some|several",
        r"|pinch(?:es)?|dash(?:es)?|to taste",
        r")\s+)?",
        r"(?:(?P<unit>",
        r"thumb|cloves?|unit|cups?|ounces?|oz|teaspoons?|tsp|tablespoons?|tbsp|tb",
        r"|grams?|kg|g|ml|l|pinch|cans?|stalks?|heads?|bunch(?:es)?|slices?",
        r"|packets?|packs?|box|container|bottle|pieces?|lb|pounds?",
        r"|qt|quarts?|pt|pints?|gallons?|gal|drops?|dashes|leaves",
        r")\s+)?",
        r"(?P<name>.+)$",
    ))
    .expect("valid regex")
});

/// Bare nouns that commonly stand in for a unit when a quantity is present
/// but no vocabulary unit matched ("1 Lime", "2 Scallions").
const COUNT_NOUNS: &[&str] = &[
    "thumb",
    "clove",
    "cloves",
    "unit",
    "lime",
    "lemon",
    "scallion",
    "scallions",
    "garlic",
    "ginger",
    "shallot",
];

const WORD_NUMBERS: &[(&str, f64)] = &[
    ("a", 1.0),
    ("an", 1.0),
    ("one", 1.0),
    ("two", 2.0),
    ("three", 3.0),
    ("four", 4.0),
    ("five", 5.0),
    ("six", 6.0),
    ("seven", 7.0),
    ("eight", 8.0),
    ("nine", 9.0),
    ("ten", 10.0),
];

/// Decomposes one ingredient line into quantity, unit, name and any embedded
/// allergen disclosure. The line's normalized text is always kept verbatim in
/// `full_text` regardless of parse outcome.
pub fn parse_ingredient_line(raw: &str) -> Ingredient {
    let full_text = clean_text(raw).unwrap_or_default();
    // allergens come from the raw text, before any normalization
    let allergens = extract_allergens(raw);

    let mut quantity_token: Option<String> = None;
    let mut unit: Option<String> = None;
    let mut name = full_text.clone();

    if let Some(caps) = INGREDIENT_LINE.captures(&full_text) {
        quantity_token = caps.name("quantity").map(|m| m.as_str().to_string());
        unit = caps.name("unit").map(|m| m.as_str().to_string());
        name = caps
            .name("name")
            .map(|m| m.as_str())
            .unwrap_or(&full_text)
            .trim()
            .trim_end_matches(',')
            .trim()
            .to_string();

        // a quantity without a vocabulary unit: the first word of the name
        // may itself be the count unit ("1 Lime" -> unit "Lime", empty name)
        if quantity_token.is_some() && unit.is_none() {
            let (head, rest) = match name.split_once(' ') {
                Some((head, rest)) => (head.to_string(), rest.to_string()),
                None => (name.clone(), String::new()),
            };
            if COUNT_NOUNS.contains(&head.to_lowercase().as_str()) {
                unit = Some(head);
                name = rest;
            }
        }
    }

    if !allergens.is_empty() {
        name = strip_disclosure(&name);
    }

    Ingredient {
        name: clean_text(&name),
        quantity: quantity_token.map(|token| quantity_value(&token)),
        unit: unit.and_then(|u| clean_text(&u)),
        full_text,
        allergens,
    }
}

/// Parses a batch of ingredient lines and aggregates the allergens disclosed
/// across all of them. Every line is scanned; a page-level disclosure
/// elsewhere is neither assumed nor required.
pub fn parse_ingredient_lines(lines: &[String]) -> (Vec<Ingredient>, BTreeSet<String>) {
    let mut ingredients = Vec::new();
    let mut allergens = BTreeSet::new();
    for line in lines {
        let ingredient = parse_ingredient_line(line);
        if ingredient.full_text.is_empty() {
            continue;
        }
        allergens.extend(ingredient.allergens.iter().cloned());
        ingredients.push(ingredient);
    }
    (ingredients, allergens)
}

/// Converts a captured quantity token to a number where possible; tokens that
/// do not convert ("pinch", "to taste") are kept as-is, never discarded.
fn quantity_value(token: &str) -> Quantity {
    let lower = token.to_lowercase();
    if let Some((_, n)) = WORD_NUMBERS.iter().find(|(word, _)| *word == lower) {
        return Quantity::Number(*n);
    }
    if lower.contains('/') {
        if let Some(value) = fraction_value(&lower) {
            return Quantity::Number(value);
        }
    } else if let Ok(value) = lower.parse::<f64>() {
        return Quantity::Number(value);
    }
    Quantity::Text(token.to_string())
}

/// "a/b" and mixed "w a/b" (space or hyphen separated) forms.
fn fraction_value(token: &str) -> Option<f64> {
    let (whole, fraction) = match token.split_once(|c| c == ' ' || c == '-') {
        Some((whole, fraction)) => (whole.parse::<f64>().ok()?, fraction),
        None => (0.0, token),
    };
    let (numerator, denominator) = fraction.split_once('/')?;
    let numerator = numerator.parse::<f64>().ok()?;
    let denominator = denominator.parse::<f64>().ok()?;
    if denominator == 0.0 {
        return None;
    }
    Some(whole + numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_unit_name() {
        let ing = parse_ingredient_line("1 Thumb Ginger");
        assert_eq!(ing.quantity, Some(Quantity::Number(1.0)));
        assert_eq!(ing.unit.as_deref(), Some("Thumb"));
        assert_eq!(ing.name.as_deref(), Some("Ginger"));
        assert_eq!(ing.full_text, "1 Thumb Ginger");
    }

    #[test]
    fn decimal_quantity() {
        let ing = parse_ingredient_line("1.5 cup Jasmine Rice");
        assert_eq!(ing.quantity, Some(Quantity::Number(1.5)));
        assert_eq!(ing.unit.as_deref(), Some("cup"));
        assert_eq!(ing.name.as_deref(), Some("Jasmine Rice"));
    }

    #[test]
    fn simple_fraction() {
        let ing = parse_ingredient_line("1/2 cup Panko Breadcrumbs");
        assert_eq!(ing.quantity, Some(Quantity::Number(0.5)));
        assert_eq!(ing.unit.as_deref(), Some("cup"));
    }

    #[test]
    fn mixed_number() {
        let ing = parse_ingredient_line("1 1/2 cups Flour");
        assert_eq!(ing.quantity, Some(Quantity::Number(1.5)));
        let ing = parse_ingredient_line("2-1/4 tsp Salt");
        assert_eq!(ing.quantity, Some(Quantity::Number(2.25)));
    }

    #[test]
    fn spelled_out_quantity() {
        let ing = parse_ingredient_line("two clove Garlic");
        assert_eq!(ing.quantity, Some(Quantity::Number(2.0)));
        assert_eq!(ing.unit.as_deref(), Some("clove"));
        assert_eq!(ing.name.as_deref(), Some("Garlic"));
    }

    #[test]
    fn symbolic_quantity_kept_as_text() {
        let ing = parse_ingredient_line("pinch Salt");
        assert_eq!(ing.quantity, Some(Quantity::Text("pinch".to_string())));
        assert_eq!(ing.name.as_deref(), Some("Salt"));
    }

    #[test]
    fn bare_noun_becomes_unit() {
        let ing = parse_ingredient_line("1 Lime");
        assert_eq!(ing.quantity, Some(Quantity::Number(1.0)));
        assert_eq!(ing.unit.as_deref(), Some("Lime"));
        assert_eq!(ing.name, None);

        let ing = parse_ingredient_line("2 Scallions");
        assert_eq!(ing.unit.as_deref(), Some("Scallions"));
        assert_eq!(ing.name, None);
    }

    #[test]
    fn one_letter_unit_does_not_eat_the_name() {
        let ing = parse_ingredient_line("1 garlic clove");
        assert_eq!(ing.quantity, Some(Quantity::Number(1.0)));
        assert_eq!(ing.unit.as_deref(), Some("garlic"));
        assert_eq!(ing.name.as_deref(), Some("clove"));

        let ing = parse_ingredient_line("100 g Sugar");
        assert_eq!(ing.unit.as_deref(), Some("g"));
        assert_eq!(ing.name.as_deref(), Some("Sugar"));
    }

    #[test]
    fn no_match_keeps_full_text_as_name() {
        let ing = parse_ingredient_line("Salt");
        assert_eq!(ing.quantity, None);
        assert_eq!(ing.unit, None);
        assert_eq!(ing.name.as_deref(), Some("Salt"));
    }

    #[test]
    fn allergens_extracted_and_stripped_from_name() {
        let ing = parse_ingredient_line("1 tablespoon Soy Sauce (Contains: Soy, Wheat)");
        assert_eq!(ing.name.as_deref(), Some("Soy Sauce"));
        assert_eq!(ing.unit.as_deref(), Some("tablespoon"));
        assert!(ing.allergens.contains("Soy"));
        assert!(ing.allergens.contains("Wheat"));
        assert_eq!(ing.full_text, "1 tablespoon Soy Sauce (Contains: Soy, Wheat)");
    }

    #[test]
    fn batch_aggregates_allergens_and_skips_blank_lines() {
        let lines = vec![
            "1 Thumb Ginger".to_string(),
            "  ".to_string(),
            "12 ounce Chicken Tenders".to_string(),
            "1 tablespoon Soy Sauce (Contains: Soy, Wheat)".to_string(),
            "1 teaspoon Sesame Seeds (Contains: soy)".to_string(),
        ];
        let (ingredients, allergens) = parse_ingredient_lines(&lines);
        assert_eq!(ingredients.len(), 4);
        assert_eq!(
            allergens,
            ["Soy", "Wheat"].iter().map(|s| s.to_string()).collect()
        );
    }
}
