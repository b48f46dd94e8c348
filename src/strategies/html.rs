//! Generic extraction from ordinary documentation markup: navigation lists,
//! heading outline, breadcrumbs.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::graph::{GenerationMetadata, NodeType, ParseResult};
use crate::strategies::{
    NodeSet, StrategyError, anchor_to_first, element_text, item_href, item_text, list_items,
    nested_lists, resolve_href, selector,
};

pub const NAME: &str = "html";
pub const BASE_CONFIDENCE: f64 = 0.5;
pub const MAX_CONFIDENCE: f64 = 0.7;
const EDGE_CONFIDENCE: f64 = 0.7;
const MAX_NAV_DEPTH: usize = 3;

static NAV_CONTAINERS: LazyLock<Selector> = LazyLock::new(|| selector("nav, aside"));
static LISTS: LazyLock<Selector> = LazyLock::new(|| selector("ul, ol"));
static HEADINGS: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2, h3"));
static BREADCRUMBS: LazyLock<Selector> = LazyLock::new(|| {
    selector(
        "[aria-label='breadcrumb'], [aria-label='Breadcrumb'], [aria-label='breadcrumbs'], \
         .breadcrumb, .breadcrumbs",
    )
});
static BREADCRUMB_ITEMS: LazyLock<Selector> = LazyLock::new(|| selector("li"));
static BREADCRUMB_LINKS: LazyLock<Selector> = LazyLock::new(|| selector("a"));
static STRUCTURE: LazyLock<Selector> = LazyLock::new(|| selector("nav, aside, h1, h2, h3"));

pub fn can_handle(html: &str) -> bool {
    let document = Html::parse_document(html);
    document.select(&STRUCTURE).next().is_some() || document.select(&BREADCRUMBS).next().is_some()
}

pub fn parse(html: &str, url: &str) -> Result<ParseResult, StrategyError> {
    let base = Url::parse(url)?;
    let document = Html::parse_document(html);

    // the three passes share one set, so the first pass to produce an id keeps it
    let mut nodes = NodeSet::default();
    extract_navigation(&document, &base, &mut nodes);
    extract_headings(&document, &mut nodes);
    extract_breadcrumbs(&document, &base, &mut nodes);

    if nodes.is_empty() {
        return Err(StrategyError::no_match(NAME, "no navigation, headings or breadcrumbs"));
    }

    let has_product = nodes.has_type(NodeType::Product);
    let has_feature = nodes.has_type(NodeType::Feature);
    let has_component = nodes.has_type(NodeType::Component);

    let nodes = nodes.into_vec();
    let edges = anchor_to_first(&nodes, EDGE_CONFIDENCE);

    let mut confidence = BASE_CONFIDENCE;
    if !edges.is_empty() {
        confidence += 0.1;
    }
    if has_product && has_feature {
        confidence += 0.05;
    }
    if has_component {
        confidence += 0.05;
    }

    Ok(ParseResult {
        nodes,
        edges,
        metadata: GenerationMetadata::new(url, NAME, confidence.min(MAX_CONFIDENCE)),
    })
}

fn is_breadcrumb(element: ElementRef) -> bool {
    BREADCRUMBS.matches(&element)
}

fn extract_navigation(document: &Html, base: &Url, nodes: &mut NodeSet) {
    for container in document.select(&NAV_CONTAINERS) {
        if is_breadcrumb(container) {
            continue;
        }

        for list in container.select(&LISTS) {
            if is_top_level_list(list, container) {
                walk_list(list, 1, base, nodes);
            }
        }
    }
}

/// A list with no `li` ancestor between it and its navigation container.
fn is_top_level_list(list: ElementRef, container: ElementRef) -> bool {
    for ancestor in list.ancestors() {
        if ancestor.id() == container.id() {
            return true;
        }
        if let Some(el) = ElementRef::wrap(ancestor)
            && el.value().name() == "li"
        {
            return false;
        }
    }
    true
}

fn walk_list(list: ElementRef, depth: usize, base: &Url, nodes: &mut NodeSet) {
    for item in list_items(list) {
        let doc_url = item_href(item).and_then(|href| resolve_href(base, href));
        nodes.insert_label(NodeType::from_depth(depth), &item_text(item), |node| {
            node.with_level(depth as u8)
                .with_doc_url(doc_url)
                .with_source(format!("nav li (depth {depth})"))
        });

        if depth < MAX_NAV_DEPTH {
            for nested in nested_lists(item) {
                walk_list(nested, depth + 1, base, nodes);
            }
        }
    }
}

fn extract_headings(document: &Html, nodes: &mut NodeSet) {
    for heading in document.select(&HEADINGS) {
        let name = heading.value().name();
        let rank = match name {
            "h1" => 1,
            "h2" => 2,
            _ => 3,
        };
        nodes.insert_label(NodeType::from_depth(rank), &element_text(heading), |node| {
            node.with_level(rank as u8).with_source(name)
        });
    }
}

fn extract_breadcrumbs(document: &Html, base: &Url, nodes: &mut NodeSet) {
    let Some(trail) = document.select(&BREADCRUMBS).next() else {
        return;
    };

    let mut crumbs: Vec<ElementRef> = trail.select(&BREADCRUMB_ITEMS).collect();
    if crumbs.is_empty() {
        crumbs = trail.select(&BREADCRUMB_LINKS).collect();
    }

    for (position, crumb) in crumbs.into_iter().enumerate() {
        let href = if crumb.value().name() == "a" {
            crumb.value().attr("href")
        } else {
            crumb
                .select(&BREADCRUMB_LINKS)
                .next()
                .and_then(|a| a.value().attr("href"))
        };
        let doc_url = href.and_then(|href| resolve_href(base, href));
        let depth = position + 1;

        nodes.insert_label(NodeType::from_depth(depth), &element_text(crumb), |node| {
            node.with_level(depth.min(3) as u8)
                .with_doc_url(doc_url)
                .with_source("breadcrumb")
        });
    }
}
