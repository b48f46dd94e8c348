//! Extraction strategies, tried in a fixed priority order by the parser.

pub mod heuristic;
pub mod html;
pub mod schema;
pub mod template;

use scraper::{ElementRef, Node, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

use crate::graph::{ExtractedEdge, ExtractedNode, NodeType, ParseResult, text::clean_label};

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("{strategy}: {reason}")]
    NoMatch {
        strategy: &'static str,
        reason: String,
    },

    #[error("invalid schema document: {0}")]
    InvalidSchema(String),

    #[error("invalid page url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl StrategyError {
    pub(crate) fn no_match(strategy: &'static str, reason: impl Into<String>) -> Self {
        Self::NoMatch {
            strategy,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Template,
    Schema,
    Html,
    Heuristic,
}

impl Strategy {
    /// Priority order.
    pub const ALL: [Strategy; 4] = [
        Strategy::Template,
        Strategy::Schema,
        Strategy::Html,
        Strategy::Heuristic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Schema => "schema",
            Self::Html => "html",
            Self::Heuristic => "heuristic",
        }
    }

    /// Nominal confidence; the score reported in a result's metadata may be lower.
    pub fn confidence(&self) -> f64 {
        match self {
            Self::Template => template::CONFIDENCE,
            Self::Schema => schema::OPENAPI_CONFIDENCE,
            Self::Html => html::MAX_CONFIDENCE,
            Self::Heuristic => heuristic::MAX_CONFIDENCE,
        }
    }

    pub fn can_handle(&self, html: &str, url: &str) -> bool {
        match self {
            Self::Template => template::can_handle(url),
            Self::Schema => schema::can_handle(html),
            Self::Html => html::can_handle(html),
            Self::Heuristic => true,
        }
    }

    pub fn parse(&self, html: &str, url: &str) -> Result<ParseResult, StrategyError> {
        match self {
            Self::Template => template::parse(html, url),
            Self::Schema => schema::parse(html, url),
            Self::Html => html::parse(html, url),
            Self::Heuristic => Ok(heuristic::parse(html, url)),
        }
    }
}

pub(crate) fn selector(css: &str) -> Selector {
    // only called with literals from this crate
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

fn is_list(element: &ElementRef) -> bool {
    matches!(element.value().name(), "ul" | "ol")
}

/// Direct element children of `element`.
pub(crate) fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

/// `ul`/`ol` elements directly under a list item.
pub(crate) fn nested_lists<'a>(item: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    child_elements(item).filter(is_list)
}

/// `li` elements directly under a list.
pub(crate) fn list_items<'a>(list: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    child_elements(list).filter(|el| el.value().name() == "li")
}

/// Text of a list item, ignoring any nested lists.
pub(crate) fn item_text(item: ElementRef) -> String {
    let mut text = String::new();
    for child in item.children() {
        match child.value() {
            Node::Text(t) => {
                text.push_str(t);
                text.push(' ');
            }
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    if is_list(&el) {
                        break;
                    }
                    text.extend(el.text());
                    text.push(' ');
                }
            }
            _ => {}
        }
    }
    text
}

/// First link of a list item that is not inside one of its nested lists.
pub(crate) fn item_href<'a>(item: ElementRef<'a>) -> Option<&'a str> {
    for el in child_elements(item) {
        if is_list(&el) {
            break;
        }
        if el.value().name() == "a" {
            return el.value().attr("href");
        }
        if let Some(anchor) = el.select(&ANCHOR).next() {
            return anchor.value().attr("href");
        }
    }
    None
}

pub(crate) fn element_text(element: ElementRef) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

/// Absolute form of `href`, skipping fragments and non-navigational schemes.
pub(crate) fn resolve_href(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    let lowered = href.to_ascii_lowercase();
    if href.is_empty()
        || href.starts_with('#')
        || lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
    {
        return None;
    }
    base.join(href).ok().map(|u| u.to_string())
}

/// Insertion-ordered node collection that keeps the first node for each id.
#[derive(Debug, Default)]
pub(crate) struct NodeSet {
    nodes: Vec<ExtractedNode>,
    seen: HashSet<String>,
}

impl NodeSet {
    pub fn insert(&mut self, node: ExtractedNode) -> bool {
        if self.seen.insert(node.id.clone()) {
            self.nodes.push(node);
            true
        } else {
            false
        }
    }

    /// Builds a node from a raw label; labels that fail cleaning are skipped.
    pub fn insert_label(
        &mut self,
        node_type: NodeType,
        raw_label: &str,
        build: impl FnOnce(ExtractedNode) -> ExtractedNode,
    ) -> Option<String> {
        let label = clean_label(raw_label)?;
        let node = build(ExtractedNode::new(node_type, label));
        let id = node.id.clone();
        self.insert(node);
        Some(id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn has_type(&self, node_type: NodeType) -> bool {
        self.nodes.iter().any(|n| n.node_type == node_type)
    }

    pub fn into_vec(self) -> Vec<ExtractedNode> {
        self.nodes
    }
}

/// Links every feature to the first product, and every component to the first
/// feature (or the first product when there is no feature).
pub(crate) fn anchor_to_first(nodes: &[ExtractedNode], confidence: f64) -> Vec<ExtractedEdge> {
    let first_of = |t: NodeType| nodes.iter().find(|n| n.node_type == t).map(|n| n.id.as_str());
    let product = first_of(NodeType::Product);
    let feature = first_of(NodeType::Feature);

    nodes
        .iter()
        .filter_map(|node| {
            let parent = match node.node_type {
                NodeType::Product => None,
                NodeType::Feature => product,
                NodeType::Component => feature.or(product),
            }?;
            Some(ExtractedEdge::hierarchy(parent, &node.id, confidence))
        })
        .collect()
}
