//! Page-fetching collaborator. The extraction core performs no I/O itself;
//! this module satisfies the contract it expects from a fetcher: bounded
//! time, a small fixed retry count with increasing backoff, and fail-fast on
//! a definitive not-found response.

use std::thread;
use std::time::Duration;

use log::{error, info};
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;

use crate::config::FetchConfig;
use crate::error::ScrapeError;

const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (compatible; RecipeHarvest/0.3)";

/// Fetches the page markup for a recipe URL.
pub fn fetch_page(url: &str, config: &FetchConfig) -> Result<String, ScrapeError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    if config.request_delay_secs > 0 {
        thread::sleep(Duration::from_secs(config.request_delay_secs));
    }

    let mut last_error: Option<ScrapeError> = None;
    for attempt in 0..config.max_retries {
        if attempt > 0 {
            let backoff = config.backoff_factor * 2f64.powi(attempt as i32 - 1);
            thread::sleep(Duration::from_secs_f64(backoff));
        }

        let request = client
            .get(url)
            .header(USER_AGENT, user_agent(config, attempt));
        match request.send() {
            Ok(response) => {
                let status = response.status();
                if status == StatusCode::NOT_FOUND {
                    // definitive: the page does not exist, retrying is pointless
                    return Err(ScrapeError::NotFound(url.to_string()));
                }
                if status.is_success() {
                    let body = response.text()?;
                    info!("fetched {url} ({} bytes)", body.len());
                    return Ok(body);
                }
                error!("HTTP {status} for {url} (attempt {})", attempt + 1);
                last_error = Some(ScrapeError::HttpStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
            Err(err) => {
                error!("request error for {url}: {err} (attempt {})", attempt + 1);
                last_error = Some(ScrapeError::Fetch(err));
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ScrapeError::EmptyPage(url.to_string())))
}

fn user_agent(config: &FetchConfig, attempt: u32) -> &str {
    if config.user_agents.is_empty() {
        return FALLBACK_USER_AGENT;
    }
    &config.user_agents[attempt as usize % config.user_agents.len()]
}
