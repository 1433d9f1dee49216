mod app_config;
pub mod candle;
pub mod indicators;
mod screen;

pub use app_config::{normalize_base_url, AppConfig, LlmConfig};
pub use candle::{Candle, CandleSeries};
pub use indicators::ChartIndicators;
pub use screen::{
    BackendDescriptor, Component, ParserDescriptor, ParserElement, ReconciledElement,
    ReconciliationResult, Region, SemanticElement,
};
