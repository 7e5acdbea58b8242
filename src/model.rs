use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One extracted recipe. Every optional field is `None` when no strategy
/// yielded a value, so consumers can tell "not found" from "found and empty".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeRecord {
    pub source_url: String,
    pub external_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub prep_time_minutes: Option<u32>,
    pub cook_time_minutes: Option<u32>,
    pub total_time_minutes: Option<u32>,
    /// Raw machine-duration codes as found in the embedded data (e.g. "PT35M").
    pub prep_time_code: Option<String>,
    pub cook_time_code: Option<String>,
    pub total_time_code: Option<String>,
    pub servings: Option<u32>,
    pub image_url: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<String>,
    /// Canonical nutrient key to numeric magnitude. Units are not preserved.
    pub nutrition: BTreeMap<String, f64>,
    pub tags: BTreeSet<String>,
    pub cuisine: Option<String>,
    pub category: Option<String>,
    /// Whatever date string the page declared, left unparsed.
    pub date_published: Option<String>,
    /// Aggregated across all ingredient lines.
    pub allergens: BTreeSet<String>,
    pub captured_at: DateTime<Utc>,
    pub disclaimer: &'static str,
}

/// One parsed ingredient line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ingredient {
    pub name: Option<String>,
    pub quantity: Option<Quantity>,
    pub unit: Option<String>,
    /// The normalized original line, kept for audit and debugging.
    pub full_text: String,
    /// Allergens disclosed within this line's text.
    pub allergens: BTreeSet<String>,
}

/// A quantity token: numeric when it converts, the original token otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Quantity {
    Number(f64),
    Text(String),
}
