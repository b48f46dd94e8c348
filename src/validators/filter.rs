//! Relevance filtering: label bounds, navigation boilerplate, and a priority-ranked cap.

use std::collections::HashSet;

use crate::graph::{ExtractedEdge, ExtractedNode, NodeType};

pub const DEFAULT_MAX_NODES: usize = 50;

pub const DEFAULT_BLACKLIST: [&str; 24] = [
    "home",
    "about",
    "about us",
    "contact",
    "contact us",
    "login",
    "log in",
    "logout",
    "sign in",
    "sign up",
    "register",
    "search",
    "menu",
    "footer",
    "header",
    "navigation",
    "skip to content",
    "skip to main content",
    "privacy",
    "privacy policy",
    "terms",
    "cookies",
    "next",
    "previous",
];

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOptions {
    pub min_label_length: usize,
    pub max_label_length: usize,
    pub max_nodes: usize,
    pub blacklist: Vec<String>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            min_label_length: 3,
            max_label_length: 100,
            max_nodes: DEFAULT_MAX_NODES,
            blacklist: DEFAULT_BLACKLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn type_weight(node_type: NodeType) -> i64 {
    match node_type {
        NodeType::Product => 100,
        NodeType::Feature => 50,
        NodeType::Component => 25,
    }
}

/// Ranking used when more than `max_nodes` survive. Nodes without a level count as level 3.
pub fn priority_score(node: &ExtractedNode) -> i64 {
    let data = &node.data;
    let mut score = type_weight(node.node_type);
    if data.description.is_some() {
        score += 10;
    }
    if data.doc_url.is_some() {
        score += 5;
    }
    if data.icon.is_some() {
        score += 3;
    }
    if data.tags.as_ref().is_some_and(|t| !t.is_empty()) {
        score += 2;
    }
    score + (4 - i64::from(node.level.unwrap_or(3))) * 5
}

fn is_relevant(node: &ExtractedNode, options: &FilterOptions) -> bool {
    let label = node.data.label.trim();
    let len = label.chars().count();
    if len < options.min_label_length || len > options.max_label_length {
        return false;
    }

    let lowered = label.to_lowercase();
    !options.blacklist.iter().any(|entry| *entry == lowered)
}

/// Drops irrelevant nodes, then keeps the `max_nodes` highest-priority ones in their
/// original order.
pub fn filter_nodes(nodes: Vec<ExtractedNode>, options: &FilterOptions) -> Vec<ExtractedNode> {
    let relevant: Vec<ExtractedNode> = nodes
        .into_iter()
        .filter(|node| is_relevant(node, options))
        .collect();

    if relevant.len() <= options.max_nodes {
        return relevant;
    }

    let mut ranked: Vec<usize> = (0..relevant.len()).collect();
    // stable: equal scores keep document order
    ranked.sort_by_key(|&i| std::cmp::Reverse(priority_score(&relevant[i])));
    let keep: HashSet<usize> = ranked.into_iter().take(options.max_nodes).collect();

    relevant
        .into_iter()
        .enumerate()
        .filter_map(|(i, node)| keep.contains(&i).then_some(node))
        .collect()
}

/// Drops edges whose endpoints are no longer present.
pub fn prune_edges(edges: Vec<ExtractedEdge>, nodes: &[ExtractedNode]) -> Vec<ExtractedEdge> {
    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    edges
        .into_iter()
        .filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
        .collect()
}
