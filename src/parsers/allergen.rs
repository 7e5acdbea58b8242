use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

static DISCLOSURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\((?:Contains|Allergens|Allergen Information):\s*([^)]+)\)")
        .expect("valid regex")
});
static DISCLOSURE_STRIP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*\((?:Contains|Allergens|Allergen Information):\s*[^)]+\)")
        .expect("valid regex")
});
static LIST_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*|\s+and\s+").expect("valid regex"));

/// Scans free text for a parenthetical allergen disclosure such as
/// "(Contains: Soy, Wheat)" and returns the normalized, de-duplicated set.
///
/// Returns an empty set when no disclosure is present.
pub fn extract_allergens(text: &str) -> BTreeSet<String> {
    let mut allergens = BTreeSet::new();
    if let Some(caps) = DISCLOSURE.captures(text) {
        for token in LIST_SPLIT.split(&caps[1]) {
            let trimmed = token.trim().trim_end_matches('.').trim();
            if !trimmed.is_empty() {
                allergens.insert(capitalize(trimmed));
            }
        }
    }
    allergens
}

/// Removes any allergen disclosure from the text, for use in ingredient names.
pub fn strip_disclosure(text: &str) -> String {
    DISCLOSURE_STRIP.replace_all(text, "").trim().to_string()
}

/// Canonical display form: first letter upper, remainder lower.
fn capitalize(token: &str) -> String {
    let lower = token.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => lower,
    }
}
