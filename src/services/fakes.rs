//! Deterministic in-memory collaborators for tests

use crate::error::Error;
use crate::models::{
    BackendDescriptor, Component, ParserDescriptor, ParserElement, Region, SemanticElement,
};
use crate::services::llm_client::{ChatMessage, LlmClient, Role};
use crate::services::upstream::{ChartSource, JsonFetcher, ScreenSource};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Screen source serving one fixed layout for every screen name
pub struct FakeScreenSource {
    parser: ParserDescriptor,
    backend: BackendDescriptor,
    failing: HashSet<String>,
    parser_calls: AtomicUsize,
    backend_calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl FakeScreenSource {
    /// Home-like layout: a price label that matches and a logo that does not
    pub fn with_home() -> Self {
        let element = |tag: &str| ParserElement {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
        };
        Self {
            parser: ParserDescriptor {
                screen: "home".to_string(),
                elements: vec![element("StockPriceLabel"), element("Logo"), element("VolumeBar")],
            },
            backend: BackendDescriptor {
                components: vec![Component {
                    elements: vec![
                        SemanticElement::new("price", "현재가", Some(Region::Top)),
                        SemanticElement::new("volume", "거래량", Some(Region::Bottom)),
                    ],
                }],
            },
            failing: HashSet::new(),
            parser_calls: AtomicUsize::new(0),
            backend_calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Make every fetch for `screen` fail with a network error
    pub fn failing(mut self, screen: &str) -> Self {
        self.failing.insert(screen.to_string());
        self
    }

    pub fn parser_calls(&self) -> usize {
        self.parser_calls.load(Ordering::SeqCst)
    }

    pub fn backend_calls(&self) -> usize {
        self.backend_calls.load(Ordering::SeqCst)
    }

    /// Screen names passed to the source, in call order
    pub fn requested_screens(&self) -> Vec<String> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn record(&self, screen: &str) -> Result<(), Error> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(screen.to_string());
        }
        if self.failing.contains(screen) {
            return Err(Error::Network(format!("connection refused for {}", screen)));
        }
        Ok(())
    }
}

#[async_trait]
impl ScreenSource for FakeScreenSource {
    async fn fetch_parser(&self, screen: &str) -> Result<ParserDescriptor, Error> {
        self.parser_calls.fetch_add(1, Ordering::SeqCst);
        self.record(screen)?;
        Ok(self.parser.clone())
    }

    async fn fetch_backend(&self, screen: &str) -> Result<BackendDescriptor, Error> {
        self.backend_calls.fetch_add(1, Ordering::SeqCst);
        self.record(screen)?;
        Ok(self.backend.clone())
    }
}

/// Chart source returning a synthetic rising series
pub struct FakeChartSource {
    candles: usize,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeChartSource {
    pub fn with_candles(candles: usize) -> Self {
        Self {
            candles,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            candles: 0,
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChartSource for FakeChartSource {
    async fn fetch_chart(&self, _code: &str, _base_dt: &str) -> Result<Value, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Timeout("chart service".to_string()));
        }
        let rows: Vec<Value> = (1..=self.candles)
            .map(|i| {
                json!({
                    "cur_prc": format!("+{}", 1000 + i),
                    "high_pric": format!("{}", 1010 + i),
                    "low_pric": format!("{}", 990 + i),
                    "trde_qty": format!("{}", 100 * i),
                })
            })
            .collect();
        Ok(json!({ "stk_dt_pole_chart_qry": rows }))
    }
}

/// Language model that echoes the last user message it received, or fails on demand
pub struct EchoLlm {
    fail: bool,
    last_user: Mutex<Option<String>>,
    last_history: Mutex<Vec<ChatMessage>>,
}

impl EchoLlm {
    pub fn new() -> Self {
        Self {
            fail: false,
            last_user: Mutex::new(None),
            last_history: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// User message of the most recent call
    pub fn last_user(&self) -> Option<String> {
        self.last_user.lock().ok().and_then(|m| m.clone())
    }

    /// Full message list of the most recent call
    pub fn last_history(&self) -> Vec<ChatMessage> {
        self.last_history.lock().map(|h| h.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for EchoLlm {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, Error> {
        let user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone());
        if let Ok(mut last) = self.last_user.lock() {
            *last = user.clone();
        }
        if let Ok(mut history) = self.last_history.lock() {
            *history = messages.to_vec();
        }
        if self.fail {
            return Err(Error::Llm("HTTP 503 from chat completions".to_string()));
        }
        Ok(user.unwrap_or_default())
    }
}

/// URL -> JSON body map for the compare path
pub struct FakeJsonFetcher {
    bodies: std::collections::HashMap<String, Value>,
}

impl FakeJsonFetcher {
    pub fn new(bodies: Vec<(&str, Value)>) -> Self {
        Self {
            bodies: bodies
                .into_iter()
                .map(|(url, body)| (url.to_string(), body))
                .collect(),
        }
    }
}

#[async_trait]
impl JsonFetcher for FakeJsonFetcher {
    async fn get_json(&self, url: &str) -> Result<Value, Error> {
        self.bodies.get(url).cloned().ok_or(Error::UpstreamStatus {
            status: 404,
            body: format!("no fixture for {}", url),
        })
    }
}
