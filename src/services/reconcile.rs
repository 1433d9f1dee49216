//! Alignment of parser elements with backend semantic descriptions
//!
//! Matching is a case-insensitive containment test: a semantic element matches
//! a parser element when its `element_label` occurs inside the parser `tag`
//! (never the reverse). The scan order is parser element, then backend
//! component, then semantic element, and the first hit wins.

use crate::constants::NO_DESCRIPTION;
use crate::error::Error;
use crate::models::{
    BackendDescriptor, ParserDescriptor, ParserElement, ReconciledElement, ReconciliationResult,
    SemanticElement,
};
use crate::services::upstream::JsonFetcher;
use tracing::debug;

/// A backend element usable for matching: label already case-folded
struct Candidate<'a> {
    label: String,
    element: &'a SemanticElement,
}

/// Flatten backend components in declaration order, dropping defective entries
fn candidates(backend: &BackendDescriptor) -> Vec<Candidate<'_>> {
    let mut out = Vec::new();
    let mut skipped = 0usize;

    for component in &backend.components {
        for element in &component.elements {
            match (&element.element_label, &element.description) {
                (Some(label), Some(_)) if !label.trim().is_empty() => out.push(Candidate {
                    label: label.to_lowercase(),
                    element,
                }),
                _ => skipped += 1,
            }
        }
    }

    if skipped > 0 {
        debug!(skipped, "Skipped backend elements without label or description");
    }
    out
}

fn describe(element: &ParserElement, candidates: &[Candidate<'_>]) -> ReconciledElement {
    let tag = element.tag.to_lowercase();
    let matched = candidates.iter().find(|c| tag.contains(&c.label));

    ReconciledElement {
        tag: element.tag.clone(),
        attrs: element.attrs.clone(),
        description: matched
            .and_then(|c| c.element.description.clone())
            .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        region: matched.and_then(|c| c.element.region),
    }
}

/// Reconcile one screen's parser and backend descriptors
///
/// Produces exactly one element per parser element, in parser order. Elements
/// without a matching backend label get [`NO_DESCRIPTION`].
pub fn reconcile(parser: &ParserDescriptor, backend: &BackendDescriptor) -> ReconciliationResult {
    let candidates = candidates(backend);

    ReconciliationResult {
        screen: parser.screen.clone(),
        elements: parser
            .elements
            .iter()
            .map(|element| describe(element, &candidates))
            .collect(),
    }
}

fn check_url(url: &str) -> Result<(), Error> {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "URL must start with http:// or https://, got: '{}'",
            url
        )))
    }
}

/// Fetch a parser and a backend descriptor from explicit URLs and reconcile them
///
/// Nothing is cached on this path. The parser descriptor is fetched first.
pub async fn reconcile_urls(
    fetcher: &dyn JsonFetcher,
    parser_url: &str,
    backend_url: &str,
) -> Result<ReconciliationResult, Error> {
    check_url(parser_url)?;
    check_url(backend_url)?;

    let parser: ParserDescriptor = serde_json::from_value(fetcher.get_json(parser_url.trim()).await?)
        .map_err(|e| Error::Parse(format!("Invalid parser descriptor: {}", e)))?;
    let backend: BackendDescriptor = serde_json::from_value(fetcher.get_json(backend_url.trim()).await?)
        .map_err(|e| Error::Parse(format!("Invalid backend descriptor: {}", e)))?;

    Ok(reconcile(&parser, &backend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Component, Region};
    use std::collections::BTreeMap;

    fn parser(tags: &[&str]) -> ParserDescriptor {
        ParserDescriptor {
            screen: "home".to_string(),
            elements: tags
                .iter()
                .map(|t| ParserElement {
                    tag: t.to_string(),
                    attrs: BTreeMap::new(),
                })
                .collect(),
        }
    }

    fn backend(components: Vec<Vec<SemanticElement>>) -> BackendDescriptor {
        BackendDescriptor {
            components: components
                .into_iter()
                .map(|elements| Component { elements })
                .collect(),
        }
    }

    #[test]
    fn test_containment_match() {
        let result = reconcile(
            &parser(&["StockPriceLabel"]),
            &backend(vec![vec![SemanticElement::new("price", "현재가", Some(Region::Top))]]),
        );

        assert_eq!(result.elements.len(), 1);
        assert_eq!(result.elements[0].description, "현재가");
        assert_eq!(result.elements[0].region, Some(Region::Top));
    }

    #[test]
    fn test_no_match_sentinel() {
        let result = reconcile(
            &parser(&["Logo"]),
            &backend(vec![vec![SemanticElement::new("price", "현재가", None)]]),
        );

        assert_eq!(result.elements[0].description, NO_DESCRIPTION);
        assert_eq!(result.elements[0].region, None);
        assert_eq!(result.matched_count(), 0);
    }

    #[test]
    fn test_reverse_containment_does_not_match() {
        // "price" does not contain "pricelabel"
        let result = reconcile(
            &parser(&["Price"]),
            &backend(vec![vec![SemanticElement::new("PriceLabel", "가격 라벨", None)]]),
        );
        assert_eq!(result.elements[0].description, NO_DESCRIPTION);
    }

    #[test]
    fn test_first_match_wins_in_declaration_order() {
        let result = reconcile(
            &parser(&["OrderBuyButton"]),
            &backend(vec![
                vec![SemanticElement::new("button", "일반 버튼", None)],
                vec![SemanticElement::new("buy", "매수 버튼", None)],
            ]),
        );
        assert_eq!(result.elements[0].description, "일반 버튼");

        let within_component = reconcile(
            &parser(&["OrderBuyButton"]),
            &backend(vec![vec![
                SemanticElement::new("buy", "매수 버튼", None),
                SemanticElement::new("button", "일반 버튼", None),
            ]]),
        );
        assert_eq!(within_component.elements[0].description, "매수 버튼");
    }

    #[test]
    fn test_order_and_length_preserved() {
        let input = parser(&["Header", "StockPriceLabel", "Footer", "VolumeChart"]);
        let descriptors = backend(vec![vec![
            SemanticElement::new("volume", "거래량", Some(Region::Bottom)),
            SemanticElement::new("price", "현재가", Some(Region::Top)),
        ]]);

        let first = reconcile(&input, &descriptors);
        let second = reconcile(&input, &descriptors);

        assert_eq!(first, second);
        let tags: Vec<&str> = first.elements.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["Header", "StockPriceLabel", "Footer", "VolumeChart"]);
        let descriptions: Vec<&str> = first.elements.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(descriptions, vec![NO_DESCRIPTION, "현재가", NO_DESCRIPTION, "거래량"]);
        assert_eq!(first.matched_count(), 2);
    }

    #[test]
    fn test_empty_inputs() {
        let empty_parser = reconcile(&parser(&[]), &backend(vec![vec![SemanticElement::new("a", "b", None)]]));
        assert!(empty_parser.elements.is_empty());

        let empty_backend = reconcile(&parser(&["A", "B"]), &backend(vec![]));
        assert_eq!(empty_backend.elements.len(), 2);
        assert!(empty_backend.elements.iter().all(|e| e.description == NO_DESCRIPTION));
    }

    #[test]
    fn test_defective_backend_elements_are_skipped() {
        let defective = SemanticElement {
            element_label: None,
            description: Some("라벨 없음".to_string()),
            region: None,
        };
        let blank = SemanticElement::new("  ", "빈 라벨", None);
        let no_description = SemanticElement {
            element_label: Some("price".to_string()),
            description: None,
            region: None,
        };
        let result = reconcile(
            &parser(&["StockPriceLabel"]),
            &backend(vec![vec![
                defective,
                blank,
                no_description,
                SemanticElement::new("price", "현재가", None),
            ]]),
        );
        assert_eq!(result.elements[0].description, "현재가");
    }

    #[tokio::test]
    async fn test_reconcile_urls() {
        use crate::services::fakes::FakeJsonFetcher;
        use serde_json::json;

        let fetcher = FakeJsonFetcher::new(vec![
            (
                "http://localhost:4001/parse/Home",
                json!({"screen": "Home", "elements": [{"tag": "StockPriceLabel", "attrs": {}}]}),
            ),
            (
                "http://localhost:8001/ui/Home",
                json!({"components": [{"elements": [{"element_label": "price", "description": "현재가", "region": "top"}]}]}),
            ),
        ]);

        let result = reconcile_urls(
            &fetcher,
            "http://localhost:4001/parse/Home",
            "http://localhost:8001/ui/Home",
        )
        .await
        .unwrap();
        assert_eq!(result.screen, "Home");
        assert_eq!(result.elements[0].description, "현재가");

        let missing = reconcile_urls(&fetcher, "http://localhost:4001/parse/Home", "http://nowhere/ui").await;
        assert!(matches!(missing, Err(Error::UpstreamStatus { status: 404, .. })));

        let invalid = reconcile_urls(&fetcher, "localhost:4001/parse/Home", "http://nowhere/ui").await;
        assert!(matches!(invalid, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_attrs_carried_through() {
        let mut input = parser(&["BuyButton"]);
        input.elements[0]
            .attrs
            .insert("id".to_string(), serde_json::json!("buy-btn"));
        let result = reconcile(&input, &backend(vec![]));

        assert_eq!(result.screen, "home");
        assert_eq!(result.elements[0].attrs["id"], "buy-btn");
    }
}
