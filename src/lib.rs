//! Extracts structured recipe records from recipe web pages.
//!
//! Pages expose the same recipe through two divergent channels: an embedded
//! machine-readable data block and presentation markup that drifts with site
//! redesigns. The core of this crate is the per-field strategy resolution
//! that decides which source to trust ([`resolve`]) and the text-parsing
//! layer that turns loosely-formatted strings into typed values
//! ([`parsers`]). Fetching is a thin collaborator around the core.

pub mod config;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod model;
pub mod parsers;
pub mod resolve;
pub mod selectors;

use log::info;

pub use config::FetchConfig;
pub use error::ScrapeError;
pub use extract::{extract_recipe, extract_recipe_with_data, find_embedded_recipe};
pub use model::{Ingredient, Quantity, RecipeRecord};

/// Fetches a recipe page and extracts its record, using configuration from
/// `config.toml` / the environment where present.
pub fn scrape_recipe(url: &str) -> Result<RecipeRecord, ScrapeError> {
    let config = FetchConfig::load()?;
    scrape_recipe_with_config(url, &config)
}

/// Fetches a recipe page and extracts its record with an explicit fetcher
/// configuration.
pub fn scrape_recipe_with_config(
    url: &str,
    config: &FetchConfig,
) -> Result<RecipeRecord, ScrapeError> {
    info!("scraping recipe from {url}");
    let body = fetcher::fetch_page(url, config)?;
    extract_recipe(&body, url)
}
