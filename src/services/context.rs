//! Chat context assembly and dispatch
//!
//! Every chat request becomes one [`ContextPayload`]: the normalized screen,
//! the user's section and scroll offset, the reconciled element list, chart
//! indicators on the chart screen, and the question verbatim. The payload is
//! serialized after the instruction block and sent to the language model.

use crate::constants::{CHART_SCREEN, ERROR_REPLY_PREFIX};
use crate::error::Error;
use crate::models::indicators::indicators_from_response;
use crate::models::{ChartIndicators, ReconciledElement, ReconciliationResult};
use crate::services::llm_client::LlmClient;
use crate::services::prompt::PromptConfig;
use crate::services::screen_cache::SharedScreenCache;
use crate::services::upstream::ChartSource;
use crate::utils::{get_base_dt, normalize_screen_name};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Body of `POST /chat`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    pub text: String,

    /// Raw screen path, e.g. "/Home/" or "chart"
    #[serde(default)]
    pub context: Option<String>,

    #[serde(default)]
    pub section: Option<String>,

    #[serde(default, rename = "scrollY")]
    pub scroll_y: Option<f64>,
}

/// Structured context handed to the language model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextPayload {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub screen: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    pub scroll_y: f64,

    pub elements: Vec<ReconciledElement>,

    /// Present only on the chart screen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_indicators: Option<ChartIndicators>,

    pub user_question: String,
}

impl ContextPayload {
    /// User message sent after the instruction block
    pub fn to_prompt(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Compose the payload for one question
///
/// `screen` is normalized here; indicators are kept only for the chart
/// screen and dropped for every other one.
pub fn assemble(
    screen: &str,
    section: Option<&str>,
    scroll_y: Option<f64>,
    reconciliation: &ReconciliationResult,
    chart_indicators: Option<ChartIndicators>,
    user_question: &str,
) -> ContextPayload {
    let screen = normalize_screen_name(screen);
    let chart_indicators = if screen == CHART_SCREEN {
        chart_indicators
    } else {
        None
    };

    ContextPayload {
        section: section.map(str::to_string),
        scroll_y: scroll_y.unwrap_or(0.0),
        elements: reconciliation.elements.clone(),
        chart_indicators,
        user_question: user_question.to_string(),
        screen,
    }
}

/// Reply text used when the chat path fails
pub fn error_reply(error: &Error) -> String {
    format!("{}: {}", ERROR_REPLY_PREFIX, error)
}

/// Builds chat context from the screen cache and chart feed and asks the model
pub struct ContextAssembler {
    cache: SharedScreenCache,
    chart: Arc<dyn ChartSource>,
    llm: Arc<dyn LlmClient>,
    prompt: PromptConfig,
    chart_code: String,
}

impl ContextAssembler {
    pub fn new(
        cache: SharedScreenCache,
        chart: Arc<dyn ChartSource>,
        llm: Arc<dyn LlmClient>,
        prompt: PromptConfig,
        chart_code: String,
    ) -> Self {
        Self {
            cache,
            chart,
            llm,
            prompt,
            chart_code,
        }
    }

    pub fn cache(&self) -> &SharedScreenCache {
        &self.cache
    }

    /// Fresh indicators for the configured instrument, empty on any failure
    pub async fn chart_indicators(&self) -> ChartIndicators {
        let base_dt = get_base_dt();
        match self.chart.fetch_chart(&self.chart_code, &base_dt).await {
            Ok(body) => {
                let indicators = indicators_from_response(&body);
                if indicators.is_empty() {
                    debug!(code = %self.chart_code, base_dt = %base_dt, "Chart response produced no indicators");
                }
                indicators
            }
            Err(e) => {
                warn!(code = %self.chart_code, base_dt = %base_dt, error = %e, "Chart fetch failed, using empty indicators");
                ChartIndicators::default()
            }
        }
    }

    /// Resolve screen data (and chart data on the chart screen) into a payload
    ///
    /// Screen resolution errors propagate; chart errors fail soft.
    pub async fn build_context(&self, request: &ChatRequest) -> Result<ContextPayload, Error> {
        let screen = request
            .context
            .as_deref()
            .map(normalize_screen_name)
            .unwrap_or_default();

        if screen.is_empty() {
            debug!("Chat request without screen context");
            let empty = ReconciliationResult {
                screen: String::new(),
                elements: Vec::new(),
            };
            return Ok(assemble("", request.section.as_deref(), request.scroll_y, &empty, None, &request.text));
        }

        let (reconciliation, indicators) = if screen == CHART_SCREEN {
            let (reconciliation, indicators) =
                tokio::join!(self.cache.reconciliation(&screen), self.chart_indicators());
            (reconciliation?, Some(indicators))
        } else {
            (self.cache.reconciliation(&screen).await?, None)
        };

        Ok(assemble(
            &screen,
            request.section.as_deref(),
            request.scroll_y,
            &reconciliation,
            indicators,
            &request.text,
        ))
    }

    /// Send a payload to the language model, returning its reply or an error reply
    pub async fn dispatch(&self, payload: &ContextPayload) -> String {
        let user_message = match payload.to_prompt() {
            Ok(message) => message,
            Err(e) => return error_reply(&e),
        };

        match self.llm.complete(&self.prompt.system_message(), &user_message).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Language model call failed");
                error_reply(&e)
            }
        }
    }

    /// Full chat path; always yields a reply string
    #[instrument(skip_all, fields(context = ?request.context))]
    pub async fn answer(&self, request: &ChatRequest) -> String {
        let payload = match self.build_context(request).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, upstream = e.is_upstream(), "Failed to build chat context");
                return error_reply(&e);
            }
        };

        info!(
            screen = %payload.screen,
            elements = payload.elements.len(),
            with_chart = payload.chart_indicators.is_some(),
            "Dispatching chat context"
        );

        self.dispatch(&payload).await
    }
}
