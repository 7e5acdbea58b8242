//! Per-field extraction strategy tables.
//!
//! The primary strategy for every field is a path into the page's embedded
//! JSON-LD recipe block; presentation selectors are fallbacks for when the
//! embedded data is missing or incomplete. Site redesigns move the
//! presentation markup around, so fallbacks are ordered from most to least
//! specific and the resolver skips any that no longer match.

use once_cell::sync::Lazy;
use regex::Regex;

/// One segment of a path into the embedded data tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSeg {
    Key(&'static str),
    Index(usize),
}

/// One extraction strategy for a field, evaluated in declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Path into the embedded data tree.
    EmbeddedPath(&'static [PathSeg]),
    /// First matching element's text content.
    Scalar(&'static str),
    /// First matching element's attribute value.
    Attribute {
        selector: &'static str,
        attribute: &'static str,
    },
    /// Text content of every matching element.
    List(&'static str),
}

/// Static per-field configuration. Resolution logic is generic over this.
#[derive(Debug)]
pub struct FieldSpec {
    pub strategies: &'static [Strategy],
}

impl FieldSpec {
    /// The field's embedded-data path, if one is declared.
    pub fn embedded_path(&self) -> Option<&'static [PathSeg]> {
        self.strategies.iter().find_map(|strategy| match strategy {
            Strategy::EmbeddedPath(path) => Some(*path),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey {
    Name,
    Description,
    PrepTime,
    CookTime,
    TotalTime,
    Servings,
    Image,
    Ingredients,
    Steps,
    Nutrition,
    Tags,
    Cuisine,
    Category,
    DatePublished,
    ExternalId,
}

impl FieldKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            FieldKey::Name => "name",
            FieldKey::Description => "description",
            FieldKey::PrepTime => "prep_time",
            FieldKey::CookTime => "cook_time",
            FieldKey::TotalTime => "total_time",
            FieldKey::Servings => "servings",
            FieldKey::Image => "image",
            FieldKey::Ingredients => "ingredients",
            FieldKey::Steps => "steps",
            FieldKey::Nutrition => "nutrition",
            FieldKey::Tags => "tags",
            FieldKey::Cuisine => "cuisine",
            FieldKey::Category => "category",
            FieldKey::DatePublished => "date_published",
            FieldKey::ExternalId => "external_id",
        }
    }
}

use PathSeg::Key;
use Strategy::{Attribute, EmbeddedPath, List, Scalar};

const NAME: FieldSpec = FieldSpec {
    strategies: &[
        EmbeddedPath(&[Key("name")]),
        Scalar("h1[data-test-id='recipe-name']"),
        Scalar("h1[itemprop='name']"),
        Scalar("h1"),
        Attribute {
            selector: "meta[property='og:title']",
            attribute: "content",
        },
    ],
};

const DESCRIPTION: FieldSpec = FieldSpec {
    strategies: &[
        EmbeddedPath(&[Key("description")]),
        Scalar("span[data-test-id='recipe-description']"),
        Scalar("div[data-test-id='recipe-description'] p"),
        Attribute {
            selector: "meta[name='description']",
            attribute: "content",
        },
    ],
};

const PREP_TIME: FieldSpec = FieldSpec {
    strategies: &[
        EmbeddedPath(&[Key("prepTime")]),
        Attribute {
            selector: "*[itemprop='prepTime']",
            attribute: "content",
        },
        Scalar("div[data-test-id='recipe-metadata-item-prep-time'] span"),
    ],
};

const COOK_TIME: FieldSpec = FieldSpec {
    strategies: &[
        EmbeddedPath(&[Key("cookTime")]),
        Attribute {
            selector: "*[itemprop='cookTime']",
            attribute: "content",
        },
        Scalar("div[data-test-id='recipe-metadata-item-cook-time'] span"),
    ],
};

const TOTAL_TIME: FieldSpec = FieldSpec {
    strategies: &[
        EmbeddedPath(&[Key("totalTime")]),
        Attribute {
            selector: "*[itemprop='totalTime']",
            attribute: "content",
        },
        Scalar("div[data-test-id='recipe-description-meta'] div:nth-of-type(1) span:nth-of-type(2)"),
    ],
};

const SERVINGS: FieldSpec = FieldSpec {
    strategies: &[
        EmbeddedPath(&[Key("recipeYield")]),
        Scalar("button[data-test-id='yield-select-button-yield'] span"),
        Scalar("span[data-test-id='recipe-yield']"),
        Scalar("*[itemprop='recipeYield']"),
    ],
};

const IMAGE: FieldSpec = FieldSpec {
    strategies: &[
        EmbeddedPath(&[Key("image")]),
        Attribute {
            selector: "meta[property='og:image']",
            attribute: "content",
        },
        Attribute {
            selector: "img[data-test-id='recipe-hero-image']",
            attribute: "src",
        },
    ],
};

const INGREDIENTS: FieldSpec = FieldSpec {
    strategies: &[
        EmbeddedPath(&[Key("recipeIngredient")]),
        List("div[data-test-id='ingredient-item-shipped'] div[data-test-id='ingredient-item-name']"),
        List("div[data-test-id='ingredient-item-not-shipped'] div[data-test-id='ingredient-item-name']"),
        List("*[itemprop='recipeIngredient']"),
    ],
};

const STEPS: FieldSpec = FieldSpec {
    strategies: &[
        EmbeddedPath(&[Key("recipeInstructions")]),
        List("div[data-test-id='instruction-step-description']"),
    ],
};

const NUTRITION: FieldSpec = FieldSpec {
    strategies: &[EmbeddedPath(&[Key("nutrition")])],
};

const TAGS: FieldSpec = FieldSpec {
    strategies: &[
        EmbeddedPath(&[Key("keywords")]),
        List("div[data-test-id='recipe-tags-container'] a[data-test-id='tag-link']"),
    ],
};

const CUISINE: FieldSpec = FieldSpec {
    strategies: &[EmbeddedPath(&[Key("recipeCuisine")])],
};

const CATEGORY: FieldSpec = FieldSpec {
    strategies: &[EmbeddedPath(&[Key("recipeCategory")])],
};

const DATE_PUBLISHED: FieldSpec = FieldSpec {
    strategies: &[
        EmbeddedPath(&[Key("datePublished")]),
        Attribute {
            selector: "meta[property='article:published_time']",
            attribute: "content",
        },
    ],
};

const EXTERNAL_ID: FieldSpec = FieldSpec {
    strategies: &[
        EmbeddedPath(&[Key("id")]),
        Attribute {
            selector: "meta[name='page_id']",
            attribute: "content",
        },
    ],
};

pub fn spec(key: FieldKey) -> &'static FieldSpec {
    match key {
        FieldKey::Name => &NAME,
        FieldKey::Description => &DESCRIPTION,
        FieldKey::PrepTime => &PREP_TIME,
        FieldKey::CookTime => &COOK_TIME,
        FieldKey::TotalTime => &TOTAL_TIME,
        FieldKey::Servings => &SERVINGS,
        FieldKey::Image => &IMAGE,
        FieldKey::Ingredients => &INGREDIENTS,
        FieldKey::Steps => &STEPS,
        FieldKey::Nutrition => &NUTRITION,
        FieldKey::Tags => &TAGS,
        FieldKey::Cuisine => &CUISINE,
        FieldKey::Category => &CATEGORY,
        FieldKey::DatePublished => &DATE_PUBLISHED,
        FieldKey::ExternalId => &EXTERNAL_ID,
    }
}

/// Selector for the page's embedded machine-readable data blocks.
pub const EMBEDDED_BLOCK_SELECTOR: &str = "script[type='application/ld+json']";

/// Catalog IDs are 24-character alphanumeric tokens at the end of a URL slug.
pub static EXTERNAL_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z0-9]{24})$").expect("valid regex"));

/// Presentation fallback for nutrition facts, scoped under one parent
/// container. Each row carries a label span and a value span; labels map to
/// canonical nutrient keys.
pub const NUTRITION_PARENT: &str = "div[data-test-id='nutritions']";
pub const NUTRITION_ROW: &str = "div[data-test-id='nutrition-step']";
pub const NUTRITION_LABELS: &[(&str, &str)] = &[
    ("Calories", "calories"),
    ("Fat", "fat"),
    ("Saturated Fat", "saturated_fat"),
    ("Carbohydrate", "carbohydrate"),
    ("Sugar", "sugar"),
    ("Dietary Fiber", "fiber"),
    ("Protein", "protein"),
    ("Cholesterol", "cholesterol"),
    ("Sodium", "sodium"),
];

pub const DISCLAIMER: &str = "Important note: web scraping can violate the Terms of Service of \
websites. This tool is provided for educational and demonstrational purposes only. Always review \
and respect the ToS of any website before attempting to scrape it, and proceed at your own risk.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_path_is_declared_first_where_present() {
        for key in [
            FieldKey::Name,
            FieldKey::Description,
            FieldKey::PrepTime,
            FieldKey::CookTime,
            FieldKey::TotalTime,
            FieldKey::Servings,
            FieldKey::Image,
            FieldKey::Ingredients,
            FieldKey::Steps,
            FieldKey::Nutrition,
            FieldKey::Tags,
            FieldKey::Cuisine,
            FieldKey::Category,
            FieldKey::DatePublished,
            FieldKey::ExternalId,
        ] {
            let spec = spec(key);
            assert!(!spec.strategies.is_empty(), "{} has no strategies", key.as_str());
            assert!(
                matches!(spec.strategies[0], Strategy::EmbeddedPath(_)),
                "{} does not lead with its embedded path",
                key.as_str()
            );
        }
    }

    #[test]
    fn external_id_pattern_matches_trailing_token_only() {
        let caps = EXTERNAL_ID_PATTERN
            .captures("teriyaki-chicken-tenders-5a664231ad1d6c6f007d0d72")
            .expect("should match");
        assert_eq!(&caps[1], "5a664231ad1d6c6f007d0d72");
        assert!(EXTERNAL_ID_PATTERN.captures("short-id-123").is_none());
        assert!(EXTERNAL_ID_PATTERN
            .captures("5a664231ad1d6c6f007d0d72-trailing")
            .is_none());
    }
}
