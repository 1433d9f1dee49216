use crate::error::Error;
use crate::utils;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration gathered from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Layout parser service (`GET {base}/parse/{screen}`)
    pub parser_base_url: String,

    /// Backend descriptor service (`GET {base}/ui/{screen}`)
    pub backend_base_url: String,

    /// Chart data service (`GET {base}/chart/{code}?base_dt=...`)
    pub chart_base_url: String,

    /// Instrument requested by the chart path
    pub chart_code: String,

    /// Per-call timeout for all upstream services
    pub upstream_timeout: Duration,

    /// Optional TTL for cached screen entries
    pub cache_ttl: Option<Duration>,

    pub llm: LlmConfig,

    /// Text file replacing the built-in prompt block
    pub system_prompt_file: Option<PathBuf>,

    /// Allowed CORS origins (empty means any)
    pub cors_origins: Vec<String>,

    pub port: u16,
}

/// Language model settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl AppConfig {
    /// Build the configuration from environment variables
    pub fn from_env() -> Result<Self, Error> {
        let config = Self {
            parser_base_url: normalize_base_url(&utils::get_parser_base_url())?,
            backend_base_url: normalize_base_url(&utils::get_backend_base_url())?,
            chart_base_url: normalize_base_url(&utils::get_chart_base_url())?,
            chart_code: utils::get_chart_code(),
            upstream_timeout: Duration::from_secs(utils::get_upstream_timeout_secs()),
            cache_ttl: utils::get_screen_cache_ttl_secs().map(Duration::from_secs),
            llm: LlmConfig {
                base_url: normalize_base_url(&utils::get_openai_base_url())?,
                api_key: utils::get_openai_api_key(),
                model: utils::get_model_id(),
                temperature: utils::get_llm_temperature(),
                max_tokens: utils::get_llm_max_tokens(),
                timeout: Duration::from_secs(utils::get_llm_timeout_secs()),
            },
            system_prompt_file: utils::get_system_prompt_file(),
            cors_origins: utils::get_cors_origins(),
            port: utils::get_port(),
        };

        if config.llm.api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY is not set; chat replies will report a configuration error");
        }

        Ok(config)
    }
}

/// Trim whitespace and trailing slashes, and require an http(s) scheme
pub fn normalize_base_url(raw: &str) -> Result<String, Error> {
    let base_url = raw.trim().trim_end_matches('/').to_string();

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(Error::Config(format!(
            "Invalid base_url: must start with http:// or https://, got: '{}'",
            base_url
        )));
    }

    Ok(base_url)
}
