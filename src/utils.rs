use crate::constants::{
    DEFAULT_CHART_CODE, DEFAULT_LLM_TIMEOUT_SECS, DEFAULT_PORT, DEFAULT_UPSTREAM_TIMEOUT_SECS,
    MARKET_TIMEZONE,
};
use chrono::Utc;
use chrono_tz::Tz;
use std::path::PathBuf;
use std::str::FromStr;

/// Read an environment variable, treating blank values as unset
fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an environment variable, falling back to `default` when unset or unparsable
fn env_parsed<T: FromStr>(key: &str, default: T) -> T {
    match env_non_empty(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}='{}', using default", key, raw);
            default
        }),
        None => default,
    }
}

/// Get layout parser base URL from environment variable or use default
pub fn get_parser_base_url() -> String {
    env_non_empty("PARSER_BASE_URL").unwrap_or_else(|| "http://localhost:4001".to_string())
}

/// Get backend descriptor base URL from environment variable or use default
pub fn get_backend_base_url() -> String {
    env_non_empty("BACKEND_BASE_URL").unwrap_or_else(|| "http://localhost:8001".to_string())
}

/// Get chart data base URL, defaulting to the backend service
pub fn get_chart_base_url() -> String {
    env_non_empty("CHART_BASE_URL").unwrap_or_else(get_backend_base_url)
}

/// Instrument code requested by the live chart path
pub fn get_chart_code() -> String {
    env_non_empty("CHART_CODE").unwrap_or_else(|| DEFAULT_CHART_CODE.to_string())
}

pub fn get_upstream_timeout_secs() -> u64 {
    env_parsed("UPSTREAM_TIMEOUT_SECS", DEFAULT_UPSTREAM_TIMEOUT_SECS)
}

pub fn get_openai_api_key() -> Option<String> {
    env_non_empty("OPENAI_API_KEY")
}

pub fn get_openai_base_url() -> String {
    env_non_empty("OPENAI_BASE_URL").unwrap_or_else(|| "https://api.openai.com".to_string())
}

/// Fine-tuned model id (falls back to the base model)
pub fn get_model_id() -> String {
    env_non_empty("KIWUME_MODEL_ID").unwrap_or_else(|| "gpt-4o-mini".to_string())
}

pub fn get_llm_temperature() -> f32 {
    env_parsed("LLM_TEMPERATURE", 0.7)
}

pub fn get_llm_max_tokens() -> u32 {
    env_parsed("LLM_MAX_TOKENS", 400)
}

pub fn get_llm_timeout_secs() -> u64 {
    env_parsed("LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS)
}

pub fn get_system_prompt_file() -> Option<PathBuf> {
    env_non_empty("SYSTEM_PROMPT_FILE").map(PathBuf::from)
}

/// Optional cache TTL; unset or `0` means entries live for the process lifetime
pub fn get_screen_cache_ttl_secs() -> Option<u64> {
    Some(env_parsed("SCREEN_CACHE_TTL_SECS", 0u64)).filter(|secs| *secs > 0)
}

/// Allowed CORS origins (empty means any origin)
pub fn get_cors_origins() -> Vec<String> {
    env_non_empty("CORS_ORIGINS")
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

pub fn get_port() -> u16 {
    env_parsed("PORT", DEFAULT_PORT)
}

/// Normalize a raw screen/context string into a cache key
///
/// Trims surrounding slashes and whitespace, lower-cases, and keeps the last
/// path segment, so `"/Home/"`, `"Home"` and `"home"` all become `"home"`.
pub fn normalize_screen_name(raw: &str) -> String {
    raw.trim()
        .trim_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Today's date in the market timezone as `YYYYMMDD`
pub fn get_base_dt() -> String {
    let now = Utc::now();
    match MARKET_TIMEZONE.parse::<Tz>() {
        Ok(tz) => now.with_timezone(&tz).format("%Y%m%d").to_string(),
        Err(e) => {
            tracing::warn!("Failed to parse timezone '{}': {}", MARKET_TIMEZONE, e);
            now.format("%Y%m%d").to_string()
        }
    }
}
