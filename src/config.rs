use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Fetcher configuration: the contract the page-fetching collaborator must
/// satisfy (timeout, bounded retries with backoff, politeness delay).
///
/// The extraction core itself takes no configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Total attempts per URL; transient failures retry up to this count
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Initial backoff in seconds, doubled after each failed attempt
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    /// Delay before the first request, to stay polite to the source site
    #[serde(default = "default_request_delay_secs")]
    pub request_delay_secs: u64,
    /// User agents rotated across attempts
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
            request_delay_secs: default_request_delay_secs(),
            user_agents: default_user_agents(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_factor() -> f64 {
    0.3
}

fn default_request_delay_secs() -> u64 {
    1
}

fn default_user_agents() -> Vec<String> {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/120.0.0.0 Safari/537.36"
            .to_string(),
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/120.0.0.0 Safari/537.36"
            .to_string(),
    ]
}

impl FetchConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE_HARVEST__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE_HARVEST__TIMEOUT_SECS
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            // Optional config file (can be missing)
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("RECIPE_HARVEST")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        settings.try_deserialize()
    }
}
