//! Generic per-field strategy resolution.
//!
//! One field, one ordered strategy chain: the embedded-data path first, then
//! presentation selectors. The first strategy that yields a value wins and
//! later strategies are never consulted, even when a field-specific
//! sub-parser rejects that value downstream. A failing strategy is recorded
//! as a [`StrategyMiss`] on the debug log and the chain moves on; resolving a
//! field never returns an error.

use std::fmt;

use log::debug;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::parsers::text::clean_text;
use crate::selectors::{spec, FieldKey, PathSeg, Strategy};

/// The raw value a winning strategy produced, before field-specific parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// Value found at the field's embedded-data path.
    Embedded(Value),
    /// Cleaned text of a single presentation element or attribute.
    Text(String),
    /// Cleaned text of every element a list selector matched.
    Items(Vec<String>),
}

/// One strategy in a field's chain found nothing.
#[derive(Debug)]
pub struct StrategyMiss {
    pub field: &'static str,
    pub strategy: usize,
    pub reason: String,
}

impl fmt::Display for StrategyMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field '{}' strategy #{}: {}",
            self.field, self.strategy, self.reason
        )
    }
}

enum Eval {
    /// Strategy produced a value; resolution ends with it.
    Hit(Resolved),
    /// Strategy's query matched, but nothing usable came out. The match still
    /// wins, so resolution ends with an absent field.
    Halt(String),
    /// Strategy found nothing; try the next one.
    Miss(String),
}

/// Resolves one field against the embedded data tree and the parsed document.
pub fn resolve(key: FieldKey, embedded: Option<&Value>, document: &Html) -> Option<Resolved> {
    for (index, strategy) in spec(key).strategies.iter().enumerate() {
        match evaluate(strategy, embedded, document) {
            Eval::Hit(resolved) => return Some(resolved),
            Eval::Halt(reason) => {
                note_miss(key, index, reason);
                return None;
            }
            Eval::Miss(reason) => note_miss(key, index, reason),
        }
    }
    None
}

fn evaluate(strategy: &Strategy, embedded: Option<&Value>, document: &Html) -> Eval {
    match strategy {
        Strategy::EmbeddedPath(path) => {
            let Some(tree) = embedded else {
                return Eval::Miss("no embedded data on page".to_string());
            };
            match walk_path(tree, path) {
                Some(value) if !value.is_null() => Eval::Hit(Resolved::Embedded(value.clone())),
                _ => Eval::Miss("embedded path did not resolve".to_string()),
            }
        }
        Strategy::Scalar(selector) => match parse_selector(selector) {
            Err(reason) => Eval::Miss(reason),
            Ok(sel) => match document.select(&sel).next() {
                None => Eval::Miss(format!("no element matched {selector}")),
                Some(element) => match clean_text(&element_text(element)) {
                    Some(text) => Eval::Hit(Resolved::Text(text)),
                    None => Eval::Halt(format!("{selector} matched but its text was empty")),
                },
            },
        },
        Strategy::Attribute {
            selector,
            attribute,
        } => match parse_selector(selector) {
            Err(reason) => Eval::Miss(reason),
            Ok(sel) => match document.select(&sel).next() {
                None => Eval::Miss(format!("no element matched {selector}")),
                Some(element) => match element.value().attr(attribute).and_then(clean_text) {
                    Some(text) => Eval::Hit(Resolved::Text(text)),
                    None => Eval::Halt(format!("{selector} matched but [{attribute}] was empty")),
                },
            },
        },
        Strategy::List(selector) => match parse_selector(selector) {
            Err(reason) => Eval::Miss(reason),
            Ok(sel) => {
                let mut matched = false;
                let items: Vec<String> = document
                    .select(&sel)
                    .inspect(|_| matched = true)
                    .filter_map(|element| clean_text(&element_text(element)))
                    .collect();
                if matched {
                    Eval::Hit(Resolved::Items(items))
                } else {
                    Eval::Miss(format!("no elements matched {selector}"))
                }
            }
        },
    }
}

/// Walks an embedded-data path: keys index mappings, integers index
/// sequences; any mismatch makes the whole path absent.
pub fn walk_path<'a>(tree: &'a Value, path: &[PathSeg]) -> Option<&'a Value> {
    let mut current = tree;
    for segment in path {
        current = match segment {
            PathSeg::Key(key) => current.as_object()?.get(*key)?,
            PathSeg::Index(index) => current.as_array()?.get(*index)?,
        };
    }
    Some(current)
}

/// Scalar convenience: the winning value as normalized text. Embedded numbers
/// stringify; embedded structures yield nothing.
pub fn resolve_text(key: FieldKey, embedded: Option<&Value>, document: &Html) -> Option<String> {
    match resolve(key, embedded, document)? {
        Resolved::Embedded(value) => embedded_scalar(&value),
        Resolved::Text(text) => Some(text),
        Resolved::Items(items) => items.into_iter().next(),
    }
}

pub fn embedded_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => clean_text(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_selector(selector: &str) -> Result<Selector, String> {
    Selector::parse(selector).map_err(|err| format!("unparseable selector {selector}: {err}"))
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

fn note_miss(key: FieldKey, strategy: usize, reason: String) {
    let miss = StrategyMiss {
        field: key.as_str(),
        strategy,
        reason,
    };
    debug!("strategy miss: {miss}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn empty_doc() -> Html {
        Html::parse_document("<html><body></body></html>")
    }

    #[test]
    fn embedded_value_wins_over_presentation() {
        let html = Html::parse_document(
            "<html><body><h1 data-test-id='recipe-name'>Wrong Name</h1></body></html>",
        );
        let tree = json!({"name": "Embedded Name"});
        assert_eq!(
            resolve(FieldKey::Name, Some(&tree), &html),
            Some(Resolved::Embedded(json!("Embedded Name")))
        );
    }

    #[test]
    fn null_embedded_value_falls_through_to_presentation() {
        let html = Html::parse_document(
            "<html><body><h1 data-test-id='recipe-name'>Fallback Name</h1></body></html>",
        );
        let tree = json!({"name": null});
        assert_eq!(
            resolve(FieldKey::Name, Some(&tree), &html),
            Some(Resolved::Text("Fallback Name".to_string()))
        );
    }

    #[test]
    fn fallbacks_evaluated_in_declared_order() {
        let html = Html::parse_document(
            "<html><head><meta property='og:title' content='Meta Name'></head>\
             <body><h1>Plain Heading</h1></body></html>",
        );
        // h1 is declared before the og:title meta fallback
        assert_eq!(
            resolve(FieldKey::Name, None, &html),
            Some(Resolved::Text("Plain Heading".to_string()))
        );
    }

    #[test]
    fn attribute_strategy_reads_attribute_value() {
        let html = Html::parse_document(
            "<html><head><meta property='og:image' content='https://img.example/x.jpg'></head>\
             <body></body></html>",
        );
        assert_eq!(
            resolve(FieldKey::Image, None, &html),
            Some(Resolved::Text("https://img.example/x.jpg".to_string()))
        );
    }

    #[test]
    fn list_strategy_collects_all_matches() {
        let html = Html::parse_document(
            "<html><body>\
             <div data-test-id='instruction-step-description'>Step one</div>\
             <div data-test-id='instruction-step-description'>Step two</div>\
             </body></html>",
        );
        assert_eq!(
            resolve(FieldKey::Steps, None, &html),
            Some(Resolved::Items(vec![
                "Step one".to_string(),
                "Step two".to_string()
            ]))
        );
    }

    #[test]
    fn matched_but_empty_element_ends_the_chain() {
        // the empty h1 matches before og:title; the match wins, so the field
        // resolves to absent instead of falling through
        let html = Html::parse_document(
            "<html><head><meta property='og:title' content='Meta Name'></head>\
             <body><h1></h1></body></html>",
        );
        assert_eq!(resolve(FieldKey::Name, None, &html), None);
    }

    #[test]
    fn nothing_matches_resolves_absent() {
        assert_eq!(resolve(FieldKey::Cuisine, None, &empty_doc()), None);
    }

    #[test]
    fn unparseable_selector_is_a_miss_not_a_panic() {
        let html = empty_doc();
        let bad = Strategy::Scalar("span:contains('Total Time') + span");
        assert!(matches!(evaluate(&bad, None, &html), Eval::Miss(_)));
    }

    #[test]
    fn walk_path_handles_keys_and_indices() {
        let tree = json!({"steps": [{"text": "Wash produce"}, {"text": "Cook rice"}]});
        let path = [
            PathSeg::Key("steps"),
            PathSeg::Index(1),
            PathSeg::Key("text"),
        ];
        assert_eq!(walk_path(&tree, &path), Some(&json!("Cook rice")));
        assert_eq!(walk_path(&tree, &[PathSeg::Key("missing")]), None);
        assert_eq!(
            walk_path(&tree, &[PathSeg::Key("steps"), PathSeg::Index(9)]),
            None
        );
        assert_eq!(
            walk_path(&tree, &[PathSeg::Index(0)]),
            None,
            "index against a mapping must not resolve"
        );
    }

    #[test]
    fn resolve_text_stringifies_embedded_numbers() {
        let tree = json!({"recipeYield": 2});
        assert_eq!(
            resolve_text(FieldKey::Servings, Some(&tree), &empty_doc()),
            Some("2".to_string())
        );
    }
}
