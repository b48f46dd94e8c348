//! Structured sources embedded in or referenced by the page: OpenAPI/Swagger
//! documents and sitemaps.

use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

use crate::graph::{ExtractedEdge, ExtractedNode, GenerationMetadata, NodeType, ParseResult};
use crate::strategies::{NodeSet, StrategyError, anchor_to_first, element_text, resolve_href, selector};

pub const NAME: &str = "schema";
pub const OPENAPI_CONFIDENCE: f64 = 0.9;
pub const SITEMAP_CONFIDENCE: f64 = 0.7;

const HTTP_METHODS: [&str; 7] = ["get", "post", "put", "patch", "delete", "options", "head"];

static SPEC_SCRIPTS: LazyLock<Selector> = LazyLock::new(|| {
    selector(
        "script[type='application/json'], script[type='application/vnd.oai.openapi+json'], \
         script#swagger-spec, script#openapi-spec",
    )
});
static SITEMAP_LINK: LazyLock<Selector> = LazyLock::new(|| selector("link[rel='sitemap']"));
static ANCHORS: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

fn is_openapi(value: &Value) -> bool {
    value.get("openapi").is_some() || value.get("swagger").is_some()
}

/// The OpenAPI document, whether the page is the document itself or embeds it.
fn find_openapi(html: &str) -> Option<Value> {
    let trimmed = html.trim_start();
    if trimmed.starts_with('{')
        && let Ok(value) = serde_json::from_str::<Value>(trimmed)
        && is_openapi(&value)
    {
        return Some(value);
    }

    let document = Html::parse_document(html);
    document
        .select(&SPEC_SCRIPTS)
        .filter_map(|script| serde_json::from_str::<Value>(&script.text().collect::<String>()).ok())
        .find(is_openapi)
}

fn has_sitemap_reference(html: &str) -> bool {
    if html.to_ascii_lowercase().contains("sitemap.xml") {
        return true;
    }
    Html::parse_document(html).select(&SITEMAP_LINK).next().is_some()
}

pub fn can_handle(html: &str) -> bool {
    find_openapi(html).is_some() || has_sitemap_reference(html)
}

pub fn parse(html: &str, url: &str) -> Result<ParseResult, StrategyError> {
    if let Some(spec) = find_openapi(html) {
        return parse_openapi(&spec, url);
    }
    if has_sitemap_reference(html) {
        return parse_sitemap(html, url);
    }
    Err(StrategyError::no_match(NAME, "no openapi document or sitemap reference"))
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn parse_openapi(spec: &Value, url: &str) -> Result<ParseResult, StrategyError> {
    let base = Url::parse(url)?;
    let info = spec
        .get("info")
        .ok_or_else(|| StrategyError::InvalidSchema("missing info object".to_string()))?;

    let mut nodes = NodeSet::default();
    let mut edges = Vec::new();

    let title = str_field(info, "title")
        .or(base.host_str())
        .unwrap_or("API");
    let product = nodes.insert_label(NodeType::Product, title, |node| {
        node.with_level(1)
            .with_description(str_field(info, "description").map(str::to_string))
            .with_doc_url(Some(url.to_string()))
            .with_source("openapi.info")
    });

    let mut tag_features: HashMap<String, String> = HashMap::new();
    for tag in spec.get("tags").and_then(Value::as_array).into_iter().flatten() {
        let Some(name) = str_field(tag, "name") else {
            continue;
        };
        let Some(feature) = nodes.insert_label(NodeType::Feature, name, |node| {
            node.with_level(2)
                .with_description(str_field(tag, "description").map(str::to_string))
                .with_source("openapi.tags")
        }) else {
            continue;
        };
        if let Some(product) = &product {
            edges.push(ExtractedEdge::hierarchy(product, &feature, OPENAPI_CONFIDENCE));
        }
        tag_features.insert(name.to_string(), feature);
    }

    let paths = spec.get("paths").and_then(Value::as_object);
    for (path, item) in paths.into_iter().flatten() {
        let Some((method, operation)) = item
            .as_object()
            .into_iter()
            .flatten()
            .find(|(key, _)| HTTP_METHODS.contains(&key.as_str()))
        else {
            continue;
        };

        let fallback = format!("{} {}", method.to_ascii_uppercase(), path);
        let label = str_field(operation, "summary")
            .or_else(|| str_field(operation, "operationId"))
            .unwrap_or(fallback.as_str());

        let Some(component) = nodes.insert_label(NodeType::Component, label, |node| {
            node.with_level(3)
                .with_description(str_field(operation, "description").map(str::to_string))
                .with_tags(vec![method.to_string()])
                .with_source(format!("openapi.paths.{path}"))
        }) else {
            continue;
        };

        let feature = operation
            .get("tags")
            .and_then(Value::as_array)
            .and_then(|tags| tags.first())
            .and_then(Value::as_str)
            .and_then(|tag| tag_features.get(tag));
        if let Some(feature) = feature {
            edges.push(ExtractedEdge::hierarchy(feature, &component, OPENAPI_CONFIDENCE));
        }
    }

    if nodes.is_empty() {
        return Err(StrategyError::InvalidSchema("no usable entries".to_string()));
    }

    Ok(ParseResult {
        nodes: nodes.into_vec(),
        edges,
        metadata: GenerationMetadata::new(url, NAME, OPENAPI_CONFIDENCE),
    })
}

/// Same-host links classified by URL path depth.
fn parse_sitemap(html: &str, url: &str) -> Result<ParseResult, StrategyError> {
    let base = Url::parse(url)?;
    let document = Html::parse_document(html);
    let mut nodes = NodeSet::default();

    for anchor in document.select(&ANCHORS) {
        let Some(target) = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_href(&base, href))
            .and_then(|href| Url::parse(&href).ok())
        else {
            continue;
        };
        if target.host_str() != base.host_str() {
            continue;
        }

        let depth = target
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).count())
            .unwrap_or(0);
        if depth == 0 {
            continue;
        }

        let node_type = NodeType::from_depth(depth);
        nodes.insert_label(node_type, &element_text(anchor), |node: ExtractedNode| {
            node.with_level(depth.min(3) as u8)
                .with_doc_url(Some(target.to_string()))
                .with_source("sitemap")
        });
    }

    if nodes.is_empty() {
        return Err(StrategyError::no_match(NAME, "sitemap page has no same-site links"));
    }

    let nodes = nodes.into_vec();
    let edges = anchor_to_first(&nodes, SITEMAP_CONFIDENCE);

    Ok(ParseResult {
        nodes,
        edges,
        metadata: GenerationMetadata::new(url, NAME, SITEMAP_CONFIDENCE),
    })
}
