//! Known documentation platforms whose navigation markup is stable enough to
//! query directly.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use crate::graph::{GenerationMetadata, NodeType, ParseResult};
use crate::strategies::{
    NodeSet, StrategyError, anchor_to_first, item_href, item_text, list_items, nested_lists,
    resolve_href, selector,
};

pub const NAME: &str = "template";
pub const CONFIDENCE: f64 = 0.9;

struct Platform {
    name: &'static str,
    url_pattern: Regex,
    /// Selectors for top-level navigation items, most specific first.
    top_items: Vec<Selector>,
}

impl Platform {
    fn new(name: &'static str, pattern: &str, top_items: &[&str]) -> Self {
        Self {
            name,
            url_pattern: Regex::new(pattern).expect("Failed to compile platform pattern"),
            top_items: top_items.iter().map(|css| selector(css)).collect(),
        }
    }
}

static PLATFORMS: LazyLock<Vec<Platform>> = LazyLock::new(|| {
    vec![
        Platform::new(
            "aws",
            r"^https://docs\.aws\.amazon\.com(/|$)",
            &["#left-column nav > ul > li", ".awsdocs-toc > ul > li", "nav > ul > li"],
        ),
        Platform::new(
            "stripe",
            r"^https://(docs\.stripe\.com|stripe\.com/docs)(/|$)",
            &[".Sidebar > ul > li", "nav[aria-label] > ul > li", "nav > ul > li"],
        ),
        Platform::new(
            "github",
            r"^https://docs\.github\.com(/|$)",
            &[
                "nav[aria-label='Product sidebar'] > ul > li",
                "[data-testid='sidebar'] nav > ul > li",
                "nav > ul > li",
            ],
        ),
        Platform::new(
            "microsoft-learn",
            r"^https://learn\.microsoft\.com(/|$)",
            &["#affixed-left-container nav > ul > li", "nav > ul > li"],
        ),
        Platform::new(
            "readthedocs",
            r"^https://[a-z0-9-]+\.readthedocs\.io(/|$)",
            &["li.toctree-l1", ".wy-menu-vertical > ul > li", "nav > ul > li"],
        ),
    ]
});

fn platform_for(url: &str) -> Option<&'static Platform> {
    PLATFORMS.iter().find(|p| p.url_pattern.is_match(url))
}

pub fn can_handle(url: &str) -> bool {
    platform_for(url).is_some()
}

pub fn parse(html: &str, url: &str) -> Result<ParseResult, StrategyError> {
    let platform = platform_for(url)
        .ok_or_else(|| StrategyError::no_match(NAME, "no platform template for url"))?;
    let base = Url::parse(url)?;
    let document = Html::parse_document(html);

    let mut nodes = NodeSet::default();

    for top_selector in &platform.top_items {
        for item in document.select(top_selector) {
            let doc_url = item_href(item).and_then(|href| resolve_href(&base, href));
            nodes.insert_label(NodeType::Product, &item_text(item), |node| {
                node.with_level(1).with_doc_url(doc_url).with_source(platform.name)
            });

            for child in nested_lists(item).flat_map(list_items) {
                let doc_url = item_href(child).and_then(|href| resolve_href(&base, href));
                nodes.insert_label(NodeType::Feature, &item_text(child), |node| {
                    node.with_level(2).with_doc_url(doc_url).with_source(platform.name)
                });
            }
        }

        if !nodes.is_empty() {
            break;
        }
    }

    if nodes.is_empty() {
        return Err(StrategyError::no_match(
            NAME,
            format!("{} navigation not found in page", platform.name),
        ));
    }

    debug!(platform = platform.name, nodes = nodes.len(), "template matched");

    let nodes = nodes.into_vec();
    let edges = anchor_to_first(&nodes, CONFIDENCE);

    Ok(ParseResult {
        nodes,
        edges,
        metadata: GenerationMetadata::new(url, NAME, CONFIDENCE),
    })
}
