use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::text::clean_text;

static CODE_HOURS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)H").expect("valid regex"));
static CODE_MINUTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)M").expect("valid regex"));
static CODE_SECONDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)S").expect("valid regex"));
static TEXT_HOURS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(?:hour|hr)s?").expect("valid regex"));
static TEXT_MINUTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(?:minute|min)s?").expect("valid regex"));
static BARE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Converts a duration value from the embedded data tree into whole minutes.
///
/// Numbers are taken as minutes directly; strings go through
/// [`duration_minutes_str`]. Anything else, or a zero total, is absent.
pub fn duration_minutes(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => {
            let minutes = n.as_f64()? as i64;
            u32::try_from(minutes).ok().filter(|m| *m > 0)
        }
        Value::String(s) => duration_minutes_str(s),
        _ => None,
    }
}

/// Converts a machine duration code ("PT1H30M") or a free-text phrase
/// ("1 hour 30 minutes", "45 min") into whole minutes.
pub fn duration_minutes_str(raw: &str) -> Option<u32> {
    let cleaned = clean_text(raw)?;
    match cleaned.strip_prefix("PT") {
        Some(code) => machine_code_minutes(code),
        None => free_text_minutes(&cleaned),
    }
}

fn machine_code_minutes(code: &str) -> Option<u32> {
    let hours = first_number(&CODE_HOURS, code);
    let minutes = first_number(&CODE_MINUTES, code);
    let seconds = first_number(&CODE_SECONDS, code);
    if hours.is_none() && minutes.is_none() && seconds.is_none() {
        return None;
    }
    let mut total = hours.unwrap_or(0) * 60 + minutes.unwrap_or(0);
    // seconds only count when no hour/minute component contributed
    if total == 0 && seconds.unwrap_or(0) >= 30 {
        total = 1;
    }
    (total > 0).then_some(total)
}

fn free_text_minutes(text: &str) -> Option<u32> {
    let lower = text.to_lowercase();
    let hours = first_number(&TEXT_HOURS, &lower);
    let minutes = first_number(&TEXT_MINUTES, &lower);
    let total = if hours.is_none() && minutes.is_none() {
        BARE_NUMBER
            .find(&lower)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    } else {
        hours.unwrap_or(0) * 60 + minutes.unwrap_or(0)
    };
    (total > 0).then_some(total)
}

fn first_number(pattern: &Regex, haystack: &str) -> Option<u32> {
    pattern
        .captures(haystack)
        .and_then(|caps| caps[1].parse().ok())
}
