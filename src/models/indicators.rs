//! Technical indicators derived from a chart candle series
//!
//! # Series Convention
//! All functions take series in **chronological order** (oldest first). The
//! "latest" value of a series is therefore its last element.
//!
//! ## Scope
//! Only numeric derivation happens here. Reading crossovers, candle polarity or
//! volume trends is left to the language model, which receives these numbers
//! together with the reading rules from the prompt.

use crate::constants::{MA_WINDOWS, RECENT_WINDOW};
use crate::models::candle::{parse_candle_series, Candle};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Moving average over the last `period` closes
///
/// Returns `None` when fewer than `period` closes exist; a partial window is
/// never averaged.
pub fn latest_sma(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let window = &closes[closes.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Last `n` values of a series, chronological order preserved
fn tail(values: &[f64], n: usize) -> Vec<f64> {
    values[values.len().saturating_sub(n)..].to_vec()
}

/// Indicator block included in the chart screen context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartIndicators {
    #[serde(rename = "MA5")]
    pub ma5: Option<f64>,
    #[serde(rename = "MA10")]
    pub ma10: Option<f64>,
    #[serde(rename = "MA20")]
    pub ma20: Option<f64>,
    #[serde(rename = "MA60")]
    pub ma60: Option<f64>,
    #[serde(rename = "MA120")]
    pub ma120: Option<f64>,
    pub recent_closes: Vec<f64>,
    pub recent_highs: Vec<f64>,
    pub recent_lows: Vec<f64>,
    pub recent_volumes: Vec<f64>,
}

impl ChartIndicators {
    /// True when nothing could be derived (empty or rejected series)
    pub fn is_empty(&self) -> bool {
        *self == ChartIndicators::default()
    }
}

/// Derive moving averages and recent-window summaries from a candle series
///
/// Each MA window is evaluated independently against the full series length.
pub fn compute_indicators(series: &[Candle]) -> ChartIndicators {
    let closes: Vec<f64> = series.iter().map(|c| c.close).collect();
    let highs: Vec<f64> = series.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = series.iter().map(|c| c.low).collect();
    let volumes: Vec<f64> = series.iter().map(|c| c.volume).collect();

    let [w5, w10, w20, w60, w120] = MA_WINDOWS;

    ChartIndicators {
        ma5: latest_sma(&closes, w5),
        ma10: latest_sma(&closes, w10),
        ma20: latest_sma(&closes, w20),
        ma60: latest_sma(&closes, w60),
        ma120: latest_sma(&closes, w120),
        recent_closes: tail(&closes, RECENT_WINDOW),
        recent_highs: tail(&highs, RECENT_WINDOW),
        recent_lows: tail(&lows, RECENT_WINDOW),
        recent_volumes: tail(&volumes, RECENT_WINDOW),
    }
}

/// Indicators straight from a raw chart response, failing soft
///
/// Any defect in the payload (missing array, non-numeric field) yields the
/// default, empty indicator set instead of an error.
pub fn indicators_from_response(body: &Value) -> ChartIndicators {
    match parse_candle_series(body) {
        Ok(series) => compute_indicators(&series),
        Err(e) => {
            tracing::warn!(error = %e, "Chart data rejected, using empty indicators");
            ChartIndicators::default()
        }
    }
}
