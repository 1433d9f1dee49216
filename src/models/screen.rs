use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Structural element reported by the layout parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserElement {
    /// Component/tag name, e.g. "StockPriceLabel"
    pub tag: String,

    /// Raw attributes, passed through untouched
    #[serde(default)]
    pub attrs: BTreeMap<String, Value>,
}

/// Layout parser view of a screen (`GET /parse/{screen}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserDescriptor {
    #[serde(default)]
    pub screen: String,

    #[serde(default)]
    pub elements: Vec<ParserElement>,
}

/// Coarse vertical placement of an element on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Top,
    Middle,
    Bottom,
    #[serde(other)]
    Unknown,
}

/// Semantic description of an element from the backend
///
/// `element_label` and `description` are optional on the wire: entries missing
/// either one are skipped during reconciliation instead of failing the screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticElement {
    #[serde(default)]
    pub element_label: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub region: Option<Region>,
}

impl SemanticElement {
    pub fn new(label: &str, description: &str, region: Option<Region>) -> Self {
        Self {
            element_label: Some(label.to_string()),
            description: Some(description.to_string()),
            region,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(default)]
    pub elements: Vec<SemanticElement>,
}

/// Backend semantic view of a screen (`GET /ui/{screen}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    #[serde(default)]
    pub components: Vec<Component>,
}

/// Parser element annotated with its best backend description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledElement {
    pub tag: String,
    pub attrs: BTreeMap<String, Value>,
    pub description: String,

    /// Region of the matched semantic element, when it declared one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

/// Reconciled view of one screen, one element per parser element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub screen: String,
    pub elements: Vec<ReconciledElement>,
}

impl ReconciliationResult {
    /// Number of elements that received a real description
    pub fn matched_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| e.description != crate::constants::NO_DESCRIPTION)
            .count()
    }
}
