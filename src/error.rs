use thiserror::Error;

/// Errors that can occur while scraping a recipe page
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Failed to fetch the page at the transport level
    #[error("Failed to fetch URL: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The page definitively does not exist; never retried
    #[error("Recipe not found (404): {0}")]
    NotFound(String),

    /// A non-success HTTP status survived all retry attempts
    #[error("HTTP {status} fetching {url}")]
    HttpStatus { status: u16, url: String },

    /// No page content could be retrieved
    #[error("Could not retrieve page content from {0}")]
    EmptyPage(String),

    /// The page yielded neither embedded recipe data nor any extractable field
    #[error("No usable recipe data found on page")]
    NoRecipeData,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
