use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::{Map, Value};

use super::text::clean_text;
use crate::selectors::{NUTRITION_LABELS, NUTRITION_PARENT, NUTRITION_ROW};

static DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"));

/// Maps heterogeneous nutrition key spellings onto canonical keys and keeps
/// only the leading numeric magnitude of each value. Entries without a
/// numeric substring are omitted.
pub fn normalize_nutrition(raw: &Map<String, Value>) -> BTreeMap<String, f64> {
    let mut nutrition = BTreeMap::new();
    for (key, value) in raw {
        if key.starts_with('@') {
            continue;
        }
        if let Some(magnitude) = numeric_magnitude(value) {
            nutrition.insert(canonical_key(key), magnitude);
        }
    }
    nutrition
}

/// "fatContent" -> "fat"; anything mentioning calories -> "calories".
fn canonical_key(raw: &str) -> String {
    if raw.to_lowercase().contains("calories") {
        return "calories".to_string();
    }
    let stripped = raw.strip_suffix("Content").unwrap_or(raw).to_lowercase();
    match stripped.as_str() {
        "saturatedfat" => "saturated_fat".to_string(),
        "fiber" | "fibre" => "fiber".to_string(),
        _ => stripped,
    }
}

/// First decimal-number substring of the value, as a float magnitude.
pub fn numeric_magnitude(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => numeric_magnitude_str(s),
        _ => None,
    }
}

pub fn numeric_magnitude_str(raw: &str) -> Option<f64> {
    DECIMAL
        .find(&raw.to_lowercase())
        .and_then(|m| m.as_str().parse().ok())
}

/// Presentation fallback: reads labeled nutrition rows under the fixed parent
/// container. Only consulted when the embedded source produced zero keys.
pub fn nutrition_from_document(document: &Html) -> BTreeMap<String, f64> {
    let mut nutrition = BTreeMap::new();
    let Ok(parent_selector) = Selector::parse(NUTRITION_PARENT) else {
        return nutrition;
    };
    let Ok(row_selector) = Selector::parse(NUTRITION_ROW) else {
        return nutrition;
    };
    let Ok(span_selector) = Selector::parse("span") else {
        return nutrition;
    };
    let Some(parent) = document.select(&parent_selector).next() else {
        return nutrition;
    };
    for row in parent.select(&row_selector) {
        let spans: Vec<String> = row
            .select(&span_selector)
            .filter_map(|span| clean_text(&span.text().collect::<Vec<_>>().join(" ")))
            .collect();
        let (Some(label), Some(value)) = (spans.first(), spans.last()) else {
            continue;
        };
        if spans.len() < 2 {
            continue;
        }
        let Some(key) = NUTRITION_LABELS
            .iter()
            .find(|(l, _)| l.eq_ignore_ascii_case(label))
            .map(|(_, key)| *key)
        else {
            continue;
        };
        if let Some(magnitude) = numeric_magnitude_str(value) {
            nutrition.insert(key.to_string(), magnitude);
        }
    }
    nutrition
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn canonical_keys_from_schema_spellings() {
        let parsed = normalize_nutrition(&raw(&[
            ("calories", json!("640 kcal")),
            ("fatContent", json!("15g")),
            ("saturatedFatContent", json!("4 g")),
            ("carbohydrateContent", json!("92 g")),
            ("sodiumContent", json!("1300 mg")),
        ]));
        assert_eq!(parsed.get("calories"), Some(&640.0));
        assert_eq!(parsed.get("fat"), Some(&15.0));
        assert_eq!(parsed.get("saturated_fat"), Some(&4.0));
        assert_eq!(parsed.get("carbohydrate"), Some(&92.0));
        assert_eq!(parsed.get("sodium"), Some(&1300.0));
    }

    #[test]
    fn calories_forced_regardless_of_spelling() {
        let parsed = normalize_nutrition(&raw(&[("caloriesContent", json!("550"))]));
        assert_eq!(parsed.get("calories"), Some(&550.0));
    }

    #[test]
    fn numeric_values_pass_through() {
        let parsed = normalize_nutrition(&raw(&[("proteinContent", json!(34))]));
        assert_eq!(parsed.get("protein"), Some(&34.0));
    }

    #[test]
    fn non_numeric_values_are_omitted() {
        let parsed = normalize_nutrition(&raw(&[
            ("fatContent", json!("trace")),
            ("@type", json!("NutritionInformation")),
        ]));
        assert!(parsed.is_empty());
    }

    #[test]
    fn magnitude_takes_leading_decimal() {
        assert_eq!(numeric_magnitude_str("15.5 g"), Some(15.5));
        assert_eq!(numeric_magnitude_str("kcal 640"), Some(640.0));
        assert_eq!(numeric_magnitude_str("none"), None);
    }

    #[test]
    fn document_fallback_reads_labeled_rows() {
        let html = r#"
            <html><body>
            <div data-test-id="nutritions">
                <div data-test-id="nutrition-step"><span>Calories</span><span>640 kcal</span></div>
                <div data-test-id="nutrition-step"><span>Fat</span><span>15 g</span></div>
                <div data-test-id="nutrition-step"><span>Saturated Fat</span><span>4 g</span></div>
                <div data-test-id="nutrition-step"><span>Mystery</span><span>9 g</span></div>
            </div>
            </body></html>
        "#;
        let document = Html::parse_document(html);
        let parsed = nutrition_from_document(&document);
        assert_eq!(parsed.get("calories"), Some(&640.0));
        assert_eq!(parsed.get("fat"), Some(&15.0));
        assert_eq!(parsed.get("saturated_fat"), Some(&4.0));
        assert!(!parsed.contains_key("mystery"));
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn document_fallback_without_parent_is_empty() {
        let document = Html::parse_document("<html><body><p>no facts</p></body></html>");
        assert!(nutrition_from_document(&document).is_empty());
    }
}
