//! Record assembly: orchestrates field resolution and the text parsers over
//! one page, then applies the cross-field derivations (ID derivation, image
//! shape normalization, total-time backfill).

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use log::{debug, error, info, warn};
use scraper::{Html, Selector};
use serde_json::Value;

use crate::error::ScrapeError;
use crate::model::RecipeRecord;
use crate::parsers::ingredient::parse_ingredient_lines;
use crate::parsers::text::clean_text;
use crate::parsers::{duration, nutrition};
use crate::resolve::{self, Resolved};
use crate::selectors::{
    spec, FieldKey, DISCLAIMER, EMBEDDED_BLOCK_SELECTOR, EXTERNAL_ID_PATTERN,
};

/// Extracts one recipe record from page markup. Discovers the embedded
/// machine-readable block itself; a malformed block is treated as absent and
/// extraction falls back to presentation selectors.
pub fn extract_recipe(html: &str, url: &str) -> Result<RecipeRecord, ScrapeError> {
    let document = Html::parse_document(html);
    let embedded = find_embedded_recipe(&document);
    if embedded.is_none() {
        warn!("no embedded recipe data found for {url}; relying on presentation selectors");
    }
    assemble(&document, url, embedded)
}

/// Extraction entry for callers that already hold a parsed embedded tree.
pub fn extract_recipe_with_data(
    html: &str,
    url: &str,
    embedded: Option<Value>,
) -> Result<RecipeRecord, ScrapeError> {
    let document = Html::parse_document(html);
    assemble(&document, url, embedded)
}

/// Scans the page's embedded data blocks for a recipe node: a direct recipe
/// object, a member of a top-level array, or a member of an `@graph`.
pub fn find_embedded_recipe(document: &Html) -> Option<Value> {
    let selector = Selector::parse(EMBEDDED_BLOCK_SELECTOR).ok()?;
    for script in document.select(&selector) {
        let cleaned = sanitize_json(&script.inner_html());
        let parsed: Value = match serde_json::from_str(&cleaned) {
            Ok(value) => value,
            Err(err) => {
                debug!("embedded data block did not parse: {err}");
                continue;
            }
        };
        if let Some(recipe) = select_recipe_node(&parsed) {
            return Some(recipe.clone());
        }
    }
    None
}

fn is_recipe(item: &Value) -> bool {
    match item.get("@type") {
        Some(Value::String(t)) => t == "Recipe",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("Recipe")),
        _ => false,
    }
}

fn select_recipe_node(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find(|item| is_recipe(item)).or_else(|| {
            info!("embedded data is a list with no recipe node; taking the first item");
            items.first()
        }),
        Value::Object(map) => {
            if is_recipe(value) {
                return Some(value);
            }
            if let Some(graph) = map.get("@graph").and_then(Value::as_array) {
                return graph.iter().find(|item| is_recipe(item));
            }
            warn!("embedded data block is not typed as a recipe; using it anyway");
            Some(value)
        }
        _ => None,
    }
}

/// Embedded blocks in the wild carry stray commas, comments and leading junk.
fn sanitize_json(raw: &str) -> String {
    let mut cleaned = raw.trim().to_string();
    if !cleaned.starts_with('{') && !cleaned.starts_with('[') {
        if let Some(start) = cleaned.find('{') {
            cleaned = cleaned[start..].to_string();
        }
    }
    cleaned = cleaned.replace(",]", "]").replace(",}", "}");
    cleaned.replace("<!--", "").replace("-->", "")
}

fn assemble(
    document: &Html,
    url: &str,
    embedded: Option<Value>,
) -> Result<RecipeRecord, ScrapeError> {
    let embedded = embedded.as_ref();

    let name = resolve::resolve_text(FieldKey::Name, embedded, document);
    let description = resolve::resolve_text(FieldKey::Description, embedded, document);

    let (prep_time_code, prep_time_minutes) = duration_field(FieldKey::PrepTime, embedded, document);
    let (cook_time_code, cook_time_minutes) = duration_field(FieldKey::CookTime, embedded, document);
    let (total_time_code, mut total_time_minutes) =
        duration_field(FieldKey::TotalTime, embedded, document);
    if total_time_minutes.is_none() {
        if let (Some(prep), Some(cook)) = (prep_time_minutes, cook_time_minutes) {
            info!("backfilled total time as prep + cook ({} minutes)", prep + cook);
            total_time_minutes = Some(prep + cook);
        }
    }

    let servings = servings_field(embedded, document);
    let image_url = image_field(embedded, document);

    let ingredient_lines = lines_field(FieldKey::Ingredients, embedded, document);
    let (ingredients, allergens) = parse_ingredient_lines(&ingredient_lines);

    let steps = steps_field(embedded, document);

    let mut nutrition_info = nutrition_field(embedded, document);
    if nutrition_info.is_empty() {
        debug!("no nutrition from embedded data; trying presentation fallback");
        nutrition_info = nutrition::nutrition_from_document(document);
    }

    let tags = tags_field(embedded, document);
    let cuisine = resolve::resolve_text(FieldKey::Cuisine, embedded, document);
    let category = resolve::resolve_text(FieldKey::Category, embedded, document);
    let date_published = resolve::resolve_text(FieldKey::DatePublished, embedded, document);
    let external_id = external_id_field(url, embedded, document);

    // load-bearing fields: advisory diagnostics only, never a failure
    if name.is_none() {
        error!("recipe name missing for {url}");
    }
    if ingredients.is_empty() {
        warn!("ingredients missing for {url}");
    }
    if steps.is_empty() {
        warn!("steps missing for {url}");
    }

    let page_yielded_anything = name.is_some()
        || description.is_some()
        || prep_time_minutes.is_some()
        || cook_time_minutes.is_some()
        || total_time_minutes.is_some()
        || servings.is_some()
        || image_url.is_some()
        || !ingredients.is_empty()
        || !steps.is_empty()
        || !nutrition_info.is_empty()
        || !tags.is_empty()
        || cuisine.is_some()
        || category.is_some()
        || date_published.is_some();
    if embedded.is_none() && !page_yielded_anything {
        return Err(ScrapeError::NoRecipeData);
    }

    Ok(RecipeRecord {
        source_url: url.to_string(),
        external_id,
        name,
        description,
        prep_time_minutes,
        cook_time_minutes,
        total_time_minutes,
        prep_time_code,
        cook_time_code,
        total_time_code,
        servings,
        image_url,
        ingredients,
        steps,
        nutrition: nutrition_info,
        tags,
        cuisine,
        category,
        date_published,
        allergens,
        captured_at: Utc::now(),
        disclaimer: DISCLAIMER,
    })
}

/// Raw machine-duration code (embedded source only) plus parsed minutes from
/// whichever strategy won.
fn duration_field(
    key: FieldKey,
    embedded: Option<&Value>,
    document: &Html,
) -> (Option<String>, Option<u32>) {
    let code = match (embedded, spec(key).embedded_path()) {
        (Some(tree), Some(path)) => resolve::walk_path(tree, path)
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    };
    let minutes = match resolve::resolve(key, embedded, document) {
        Some(Resolved::Embedded(value)) => duration::duration_minutes(&value),
        Some(Resolved::Text(text)) => duration::duration_minutes_str(&text),
        Some(Resolved::Items(items)) => items
            .first()
            .and_then(|text| duration::duration_minutes_str(text)),
        None => None,
    };
    (code, minutes)
}

fn servings_field(embedded: Option<&Value>, document: &Html) -> Option<u32> {
    match resolve::resolve(FieldKey::Servings, embedded, document)? {
        Resolved::Embedded(value) => servings_from_value(&value),
        Resolved::Text(text) => first_integer(&text),
        Resolved::Items(items) => items.first().and_then(|text| first_integer(text)),
    }
}

fn servings_from_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => {
            let servings = n.as_f64()? as i64;
            u32::try_from(servings).ok()
        }
        Value::String(s) => first_integer(s),
        // multi-value yields take the first entry; see note on recipeYield
        Value::Array(items) => items.first().and_then(servings_from_value),
        _ => {
            warn!("could not parse servings from yield value: {value}");
            None
        }
    }
}

fn first_integer(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// The embedded image field may be a bare URL string, an object carrying a
/// URL-bearing key, or a sequence of either; sequences take the first entry.
fn image_field(embedded: Option<&Value>, document: &Html) -> Option<String> {
    let resolved = resolve::resolve(FieldKey::Image, embedded, document)?;
    let url = match resolved {
        Resolved::Embedded(value) => image_from_value(&value)?,
        Resolved::Text(text) => text,
        Resolved::Items(items) => items.into_iter().next()?,
    };
    let trimmed = url.trim().to_string();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn image_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(url) => Some(url.clone()),
        Value::Object(map) => map
            .get("url")
            .or_else(|| map.get("contentUrl"))
            .and_then(Value::as_str)
            .map(str::to_string),
        Value::Array(items) => items.first().and_then(image_from_value),
        _ => None,
    }
}

/// Raw ingredient lines for the ingredient parser; embedded sequences pass
/// through uncleaned so allergen extraction can see the original text.
fn lines_field(key: FieldKey, embedded: Option<&Value>, document: &Html) -> Vec<String> {
    match resolve::resolve(key, embedded, document) {
        Some(Resolved::Embedded(Value::Array(items))) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Some(Resolved::Embedded(Value::String(line))) => vec![line],
        Some(Resolved::Embedded(_)) => Vec::new(),
        Some(Resolved::Items(items)) => items,
        Some(Resolved::Text(text)) => vec![text],
        None => Vec::new(),
    }
}

fn steps_field(embedded: Option<&Value>, document: &Html) -> Vec<String> {
    match resolve::resolve(FieldKey::Steps, embedded, document) {
        Some(Resolved::Embedded(value)) => steps_from_value(&value),
        Some(Resolved::Items(items)) => items,
        Some(Resolved::Text(text)) => vec![text],
        None => Vec::new(),
    }
}

/// Embedded instructions arrive as plain strings, step objects, or sections
/// of step objects; anything else in the sequence is dropped.
fn steps_from_value(value: &Value) -> Vec<String> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    items.iter().flat_map(step_texts).collect()
}

fn step_texts(item: &Value) -> Vec<String> {
    match item {
        Value::String(step) => clean_text(step).into_iter().collect(),
        Value::Object(map) => match map.get("@type").and_then(Value::as_str) {
            Some("HowToStep") => map
                .get("text")
                .and_then(Value::as_str)
                .and_then(clean_text)
                .into_iter()
                .collect(),
            Some("HowToSection") => map
                .get("itemListElement")
                .and_then(Value::as_array)
                .map(|steps| steps.iter().flat_map(step_texts).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Primary nutrition source: the embedded nutrition mapping. Anything else
/// (or zero usable keys) leaves the fallback to the assembler.
fn nutrition_field(embedded: Option<&Value>, document: &Html) -> BTreeMap<String, f64> {
    match resolve::resolve(FieldKey::Nutrition, embedded, document) {
        Some(Resolved::Embedded(Value::Object(map))) => nutrition::normalize_nutrition(&map),
        _ => BTreeMap::new(),
    }
}

/// Tags arrive as a comma-separated string or a sequence of raw tokens.
fn tags_field(embedded: Option<&Value>, document: &Html) -> BTreeSet<String> {
    match resolve::resolve(FieldKey::Tags, embedded, document) {
        Some(Resolved::Embedded(Value::String(tags))) => {
            tags.split(',').filter_map(clean_text).collect()
        }
        Some(Resolved::Embedded(Value::Array(items))) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(tag) => clean_text(tag),
                Value::Number(tag) => Some(tag.to_string()),
                _ => None,
            })
            .collect(),
        Some(Resolved::Items(items)) => items.into_iter().collect(),
        Some(Resolved::Text(text)) => text.split(',').filter_map(clean_text).collect(),
        _ => BTreeSet::new(),
    }
}

/// External catalog ID: an identifier field on the page wins when usable,
/// taking its own trailing token if it looks like a URL and the value
/// verbatim otherwise. Without one, the source URL's trailing token is used.
fn external_id_field(url: &str, embedded: Option<&Value>, document: &Html) -> Option<String> {
    let candidate = match resolve::resolve(FieldKey::ExternalId, embedded, document) {
        Some(Resolved::Embedded(Value::String(id))) => Some(id),
        Some(Resolved::Text(text)) => Some(text),
        Some(Resolved::Items(items)) => items.into_iter().next(),
        _ => None,
    };
    match candidate {
        Some(value) => Some(trailing_token(&value).unwrap_or(value)),
        None => trailing_token(url),
    }
}

/// The 24-character alphanumeric token ending the last path segment, with any
/// query string stripped first.
fn trailing_token(value: &str) -> Option<String> {
    let path = value.split('?').next().unwrap_or(value);
    let last = path.rsplit('/').next().unwrap_or(path);
    EXTERNAL_ID_PATTERN
        .captures(last)
        .map(|caps| caps[1].to_string())
}
