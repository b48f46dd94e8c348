use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::graph::ids::{edge_id, node_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Product,
    Feature,
    Component,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Feature => "feature",
            Self::Component => "component",
        }
    }

    /// Coarse depth used when a strategy does not assign one.
    pub fn default_level(&self) -> u8 {
        match self {
            Self::Product => 1,
            Self::Feature => 2,
            Self::Component => 3,
        }
    }

    /// Maps a 1-based depth (nesting level, heading rank, path depth) onto a node type.
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 | 1 => Self::Product,
            2 => Self::Feature,
            _ => Self::Component,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Link {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_links: Option<Vec<Link>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub data: NodeData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_selector: Option<String>,
}

impl ExtractedNode {
    /// Builds a node whose id is derived from its type and label.
    pub fn new(node_type: NodeType, label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            id: node_id(node_type, &label),
            node_type,
            data: NodeData {
                label,
                ..NodeData::default()
            },
            level: Some(node_type.default_level()),
            source_selector: None,
        }
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.data.description = description;
        self
    }

    pub fn with_doc_url(mut self, doc_url: Option<String>) -> Self {
        self.data.doc_url = doc_url;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.data.tags = if tags.is_empty() { None } else { Some(tags) };
        self
    }

    pub fn with_source(mut self, selector: impl Into<String>) -> Self {
        self.source_selector = Some(selector.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeType {
    Hierarchy,
    Related,
    DependsOn,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InferenceMethod {
    Hierarchy,
    Keyword,
    Proximity,
    Explicit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<EdgeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inference_method: Option<InferenceMethod>,
}

impl ExtractedEdge {
    /// Parent-to-child hierarchy edge.
    pub fn hierarchy(source: &str, target: &str, confidence: f64) -> Self {
        Self {
            id: edge_id(source, target),
            source: source.to_string(),
            target: target.to_string(),
            edge_type: Some(EdgeType::Hierarchy),
            label: None,
            confidence: Some(confidence),
            inference_method: Some(InferenceMethod::Hierarchy),
        }
    }

    pub fn related(source: &str, target: &str, method: InferenceMethod, confidence: f64) -> Self {
        Self {
            id: edge_id(source, target),
            source: source.to_string(),
            target: target.to_string(),
            edge_type: Some(EdgeType::Related),
            label: None,
            confidence: Some(confidence),
            inference_method: Some(method),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GenerationStats {
    pub nodes_extracted: usize,
    pub nodes_final: usize,
    pub edges_extracted: usize,
    pub edges_final: usize,
    pub nodes_deduplicated: usize,
    pub nodes_filtered: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GenerationMetadata {
    pub source_url: String,
    pub generated_at: DateTime<Utc>,
    pub strategy: String,
    pub confidence: f64,
    pub warnings: Vec<String>,
    pub stats: GenerationStats,
}

impl GenerationMetadata {
    pub fn new(source_url: &str, strategy: &str, confidence: f64) -> Self {
        Self {
            source_url: source_url.to_string(),
            generated_at: Utc::now(),
            strategy: strategy.to_string(),
            confidence,
            warnings: Vec::new(),
            stats: GenerationStats::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ParseResult {
    pub nodes: Vec<ExtractedNode>,
    pub edges: Vec<ExtractedEdge>,
    pub metadata: GenerationMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_serializes_in_editor_shape() {
        let node = ExtractedNode::new(NodeType::Feature, "Object Storage")
            .with_doc_url(Some("https://docs.example.com/storage".to_string()));

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["id"], "feature-object-storage");
        assert_eq!(json["type"], "feature");
        assert_eq!(json["level"], 2);
        assert_eq!(json["data"]["docUrl"], "https://docs.example.com/storage");
        assert!(json["data"].get("description").is_none());
        assert!(json.get("sourceSelector").is_none());
    }

    #[test]
    fn test_edge_type_uses_kebab_case() {
        let mut edge = ExtractedEdge::hierarchy("product-a", "feature-b", 0.9);
        edge.edge_type = Some(EdgeType::DependsOn);

        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["type"], "depends-on");
        assert_eq!(json["inferenceMethod"], "hierarchy");
        assert_eq!(json["id"], "edge-product-a-feature-b");
    }

    #[test]
    fn test_node_type_from_depth() {
        assert_eq!(NodeType::from_depth(1), NodeType::Product);
        assert_eq!(NodeType::from_depth(2), NodeType::Feature);
        assert_eq!(NodeType::from_depth(3), NodeType::Component);
        assert_eq!(NodeType::from_depth(7), NodeType::Component);
    }

    #[test]
    fn test_metadata_keys_stay_snake_case() {
        let mut metadata = GenerationMetadata::new("https://docs.example.com", "html", 0.6);
        metadata.stats.nodes_extracted = 3;
        metadata.stats.duration_ms = 12;

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["source_url"], "https://docs.example.com");
        assert!(json.get("generated_at").is_some());
        assert!(json.get("sourceUrl").is_none());
        assert_eq!(json["stats"]["nodes_extracted"], 3);
        assert_eq!(json["stats"]["duration_ms"], 12);
        assert_eq!(json["stats"]["nodes_deduplicated"], 0);
        assert!(json["stats"].get("nodesExtracted").is_none());
    }
}
