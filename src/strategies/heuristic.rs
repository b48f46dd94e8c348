//! Last-resort extraction. Always produces a result, possibly empty.

use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use url::Url;

use crate::graph::{ExtractedEdge, GenerationMetadata, InferenceMethod, NodeType, ParseResult};
use crate::strategies::{NodeSet, anchor_to_first, element_text, resolve_href, selector};

pub const NAME: &str = "heuristic";
pub const BASE_CONFIDENCE: f64 = 0.3;
pub const MAX_CONFIDENCE: f64 = 0.5;
const HIERARCHY_CONFIDENCE: f64 = 0.5;
const KEYWORD_CONFIDENCE: f64 = 0.4;
const MAX_CANDIDATES: usize = 40;
const MIN_KEYWORD_LENGTH: usize = 4;

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static H1: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static CANDIDATES: LazyLock<Selector> =
    LazyLock::new(|| selector("li > a[href], dt, strong, b, h2, h3, h4"));

const TITLE_SEPARATORS: [&str; 4] = [" | ", " - ", " — ", " · "];

const STOP_WORDS: [&str; 24] = [
    "about", "after", "also", "from", "have", "into", "more", "only", "other", "over", "page",
    "some", "than", "that", "their", "them", "then", "there", "these", "this", "using", "when",
    "with", "your",
];

pub fn parse(html: &str, url: &str) -> ParseResult {
    let document = Html::parse_document(html);
    let base = Url::parse(url).ok();
    let mut nodes = NodeSet::default();

    if let Some(product) = product_label(&document) {
        nodes.insert_label(NodeType::Product, &product, |node| {
            node.with_level(1)
                .with_doc_url(base.as_ref().map(Url::to_string))
                .with_source("title")
        });
    }

    let mut candidates = 0;
    for element in document.select(&CANDIDATES) {
        if candidates >= MAX_CANDIDATES {
            break;
        }
        let doc_url = base
            .as_ref()
            .zip(element.value().attr("href"))
            .and_then(|(base, href)| resolve_href(base, href));
        let tag = element.value().name();

        let inserted = nodes.insert_label(NodeType::Feature, &element_text(element), |node| {
            node.with_level(2).with_doc_url(doc_url).with_source(tag)
        });
        if inserted.is_some() {
            candidates += 1;
        }
    }

    let nodes = nodes.into_vec();
    let mut edges = anchor_to_first(&nodes, HIERARCHY_CONFIDENCE);
    edges.extend(keyword_edges(&nodes));

    let mut confidence = BASE_CONFIDENCE;
    if nodes.len() >= 3 {
        confidence += 0.1;
    }
    if !edges.is_empty() {
        confidence += 0.1;
    }

    ParseResult {
        nodes,
        edges,
        metadata: GenerationMetadata::new(url, NAME, confidence.min(MAX_CONFIDENCE)),
    }
}

fn product_label(document: &Html) -> Option<String> {
    let title = document
        .select(&TITLE)
        .next()
        .map(element_text)
        .filter(|t| !t.trim().is_empty());

    if let Some(title) = title {
        let first = TITLE_SEPARATORS
            .iter()
            .fold(title.as_str(), |acc, sep| acc.split(sep).next().unwrap_or(acc));
        return Some(first.to_string());
    }

    document.select(&H1).next().map(element_text)
}

fn keywords(label: &str) -> HashSet<String> {
    label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_KEYWORD_LENGTH)
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

/// Related edges between features that share a significant word.
fn keyword_edges(nodes: &[crate::graph::ExtractedNode]) -> Vec<ExtractedEdge> {
    let features: Vec<_> = nodes
        .iter()
        .filter(|n| n.node_type == NodeType::Feature)
        .map(|n| (n.id.as_str(), keywords(&n.data.label)))
        .collect();

    let mut by_keyword: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, (_, words)) in features.iter().enumerate() {
        for word in words {
            by_keyword.entry(word.as_str()).or_default().push(index);
        }
    }

    let mut pairs: Vec<(usize, usize)> = by_keyword
        .values()
        .flat_map(|indices| {
            indices
                .iter()
                .enumerate()
                .flat_map(move |(i, a)| indices[i + 1..].iter().map(move |b| (*a, *b)))
        })
        .collect();
    pairs.sort_unstable();
    pairs.dedup();

    pairs
        .into_iter()
        .map(|(a, b)| {
            ExtractedEdge::related(
                features[a].0,
                features[b].0,
                InferenceMethod::Keyword,
                KEYWORD_CONFIDENCE,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_yields_empty_result() {
        let result = parse("<div>Plain text</div>", "https://example.com");

        assert!(result.nodes.is_empty());
        assert!(result.edges.is_empty());
        assert_eq!(result.metadata.strategy, "heuristic");
        assert!((result.metadata.confidence - BASE_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_never_fails_on_garbage() {
        let result = parse("<<<>>> \u{0000} <li><a href='::::'>", "not a url");
        assert!(result.nodes.is_empty());
    }

    #[test]
    fn test_title_becomes_product() {
        let html = r#"<html><head><title>Widget Platform | Acme Docs</title></head>
            <body><ul><li><a href="/queues">Message Queues</a></li>
            <li><a href="/topics">Message Topics</a></li></ul>
            <p><strong>Billing</strong></p></body></html>"#;

        let result = parse(html, "https://acme.example.com/");

        assert_eq!(result.nodes[0].data.label, "Widget Platform");
        assert_eq!(result.nodes[0].node_type, NodeType::Product);
        assert_eq!(result.nodes.len(), 4);
        assert_eq!(
            result.nodes[1].data.doc_url.as_deref(),
            Some("https://acme.example.com/queues")
        );

        let related: Vec<_> = result
            .edges
            .iter()
            .filter(|e| e.inference_method == Some(InferenceMethod::Keyword))
            .collect();
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].source, "feature-message-queues");
        assert_eq!(related[0].target, "feature-message-topics");
        assert!((result.metadata.confidence - MAX_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_keywords_skip_short_and_stop_words() {
        let words = keywords("Using the API with Webhooks");
        assert!(words.contains("webhooks"));
        assert!(!words.contains("using"));
        assert!(!words.contains("api"));
    }
}
