use crate::error::Error;
use crate::models::{normalize_base_url, AppConfig, BackendDescriptor, ParserDescriptor};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

/// Source of the two per-screen descriptors
#[async_trait]
pub trait ScreenSource: Send + Sync {
    /// Layout parser view of `screen`
    async fn fetch_parser(&self, screen: &str) -> Result<ParserDescriptor, Error>;

    /// Backend semantic view of `screen`
    async fn fetch_backend(&self, screen: &str) -> Result<BackendDescriptor, Error>;
}

/// Source of raw chart candles
#[async_trait]
pub trait ChartSource: Send + Sync {
    /// Raw chart response for `code` as of `base_dt` (YYYYMMDD)
    async fn fetch_chart(&self, code: &str, base_dt: &str) -> Result<Value, Error>;
}

/// Plain JSON GET, used by the compare path with caller-supplied URLs
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, Error>;
}

/// HTTP client for the layout parser, backend and chart services
///
/// One `reqwest::Client` is shared by all three upstreams and carries the fixed
/// per-call timeout. No call is retried.
pub struct UpstreamClient {
    parser_base_url: String,
    backend_base_url: String,
    chart_base_url: String,
    client: reqwest::Client,
}

impl UpstreamClient {
    /// Create a new upstream client
    ///
    /// # Arguments
    /// * `parser_base_url` - Layout parser base URL (e.g., "http://localhost:4001")
    /// * `backend_base_url` - Backend descriptor base URL (e.g., "http://localhost:8001")
    /// * `chart_base_url` - Chart data base URL
    /// * `timeout` - Per-call timeout applied to every request
    pub fn new(
        parser_base_url: &str,
        backend_base_url: &str,
        chart_base_url: &str,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        let upstream = Self {
            parser_base_url: normalize_base_url(parser_base_url)?,
            backend_base_url: normalize_base_url(backend_base_url)?,
            chart_base_url: normalize_base_url(chart_base_url)?,
            client,
        };

        info!(
            parser = %upstream.parser_base_url,
            backend = %upstream.backend_base_url,
            chart = %upstream.chart_base_url,
            timeout_secs = timeout.as_secs(),
            "Created UpstreamClient"
        );

        Ok(upstream)
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Self::new(
            &config.parser_base_url,
            &config.backend_base_url,
            &config.chart_base_url,
            config.upstream_timeout,
        )
    }

    pub fn parser_url(&self, screen: &str) -> String {
        format!("{}/parse/{}", self.parser_base_url, screen)
    }

    pub fn backend_url(&self, screen: &str) -> String {
        format!("{}/ui/{}", self.backend_base_url, screen)
    }

    pub fn chart_url(&self, code: &str, base_dt: &str) -> String {
        format!("{}/chart/{}?base_dt={}", self.chart_base_url, code, base_dt)
    }

    /// GET an arbitrary URL and decode its JSON body
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        debug!("Sending request to: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            error!(url, error = %e, "Upstream request failed");
            Error::from(e)
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response body: {}", e)))?;

        serde_json::from_str(&body)
            .map_err(|e| Error::Parse(format!("Failed to parse JSON from {}: {}", url, e)))
    }
}

#[async_trait]
impl ScreenSource for UpstreamClient {
    async fn fetch_parser(&self, screen: &str) -> Result<ParserDescriptor, Error> {
        let descriptor: ParserDescriptor = self.fetch_json(&self.parser_url(screen)).await?;
        info!(
            screen,
            elements = descriptor.elements.len(),
            "Fetched parser descriptor"
        );
        Ok(descriptor)
    }

    async fn fetch_backend(&self, screen: &str) -> Result<BackendDescriptor, Error> {
        let descriptor: BackendDescriptor = self.fetch_json(&self.backend_url(screen)).await?;
        info!(
            screen,
            components = descriptor.components.len(),
            "Fetched backend descriptor"
        );
        Ok(descriptor)
    }
}

#[async_trait]
impl ChartSource for UpstreamClient {
    async fn fetch_chart(&self, code: &str, base_dt: &str) -> Result<Value, Error> {
        let body: Value = self.fetch_json(&self.chart_url(code, base_dt)).await?;
        debug!(code, base_dt, "Fetched chart data");
        Ok(body)
    }
}

#[async_trait]
impl JsonFetcher for UpstreamClient {
    async fn get_json(&self, url: &str) -> Result<Value, Error> {
        self.fetch_json(url).await
    }
}
