//! Near-duplicate node merging by label similarity.

use std::collections::{HashMap, HashSet};

use crate::graph::{ExtractedEdge, ExtractedNode};

pub const DEFAULT_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    pub nodes: Vec<ExtractedNode>,
    /// Every input id mapped to the id of the node that absorbed it (itself for survivors).
    pub id_mapping: HashMap<String, String>,
}

pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1) // deletion
                .min(current[j] + 1) // insertion
                .min(previous[j] + cost); // substitution
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// `1 - distance / max_len` over trimmed, lowercased labels.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();

    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    1.0 - levenshtein(&a, &b) as f64 / max_len as f64
}

fn completeness(node: &ExtractedNode) -> u32 {
    let data = &node.data;
    let mut score = 0;
    if data.description.is_some() {
        score += 2;
    }
    if data.doc_url.is_some() {
        score += 1;
    }
    if data.icon.is_some() {
        score += 1;
    }
    if data.tags.as_ref().is_some_and(|t| !t.is_empty()) {
        score += 1;
    }
    score
}

/// Merges two nodes, keeping the more complete one as the base (ties keep `left`).
pub fn merge_nodes(left: ExtractedNode, right: ExtractedNode) -> ExtractedNode {
    let (mut base, other) = if completeness(&right) > completeness(&left) {
        (right, left)
    } else {
        (left, right)
    };

    let data = &mut base.data;
    let extra = other.data;

    data.description = data.description.take().or(extra.description);
    data.doc_url = data.doc_url.take().or(extra.doc_url);
    data.icon = data.icon.take().or(extra.icon);
    data.color = data.color.take().or(extra.color);

    data.tags = match (data.tags.take(), extra.tags) {
        (Some(mut tags), Some(more)) => {
            for tag in more {
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
            Some(tags)
        }
        (tags, more) => tags.or(more),
    };

    data.additional_links = match (data.additional_links.take(), extra.additional_links) {
        (Some(mut links), Some(more)) => {
            links.extend(more);
            Some(links)
        }
        (links, more) => links.or(more),
    };

    base.level = base.level.or(other.level);
    base.source_selector = base.source_selector.or(other.source_selector);
    base
}

/// Merges nodes sharing an id into the first occurrence.
fn collapse_identical_ids(nodes: Vec<ExtractedNode>) -> Vec<ExtractedNode> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<ExtractedNode> = Vec::with_capacity(nodes.len());

    for node in nodes {
        match positions.get(&node.id) {
            Some(&pos) => unique[pos] = merge_nodes(unique[pos].clone(), node),
            None => {
                positions.insert(node.id.clone(), unique.len());
                unique.push(node);
            }
        }
    }

    unique
}

/// Folds each node together with every later unprocessed node of the same type whose
/// label is at least `threshold` similar. Order-dependent: each node is compared with
/// the group's first node only.
pub fn deduplicate_nodes(nodes: Vec<ExtractedNode>, threshold: f64) -> DedupOutcome {
    let nodes = collapse_identical_ids(nodes);
    let mut processed = vec![false; nodes.len()];
    let mut outcome = DedupOutcome::default();

    for i in 0..nodes.len() {
        if processed[i] {
            continue;
        }
        processed[i] = true;

        let anchor = &nodes[i];
        let mut merged = anchor.clone();
        let mut group = vec![anchor.id.clone()];

        for j in (i + 1)..nodes.len() {
            if processed[j] || nodes[j].node_type != anchor.node_type {
                continue;
            }
            let candidate = &nodes[j];
            if similarity(&anchor.data.label, &candidate.data.label) >= threshold {
                processed[j] = true;
                group.push(candidate.id.clone());
                merged = merge_nodes(merged, candidate.clone());
            }
        }

        for id in group {
            outcome.id_mapping.insert(id, merged.id.clone());
        }
        outcome.nodes.push(merged);
    }

    outcome
}

/// Rewrites edge endpoints through `id_mapping`, then drops self-loops and repeated
/// `(source, target, type)` triples (first one wins).
pub fn update_edge_references(
    edges: Vec<ExtractedEdge>,
    id_mapping: &HashMap<String, String>,
) -> Vec<ExtractedEdge> {
    let mut seen = HashSet::new();

    edges
        .into_iter()
        .filter_map(|mut edge| {
            if let Some(source) = id_mapping.get(&edge.source) {
                edge.source = source.clone();
            }
            if let Some(target) = id_mapping.get(&edge.target) {
                edge.target = target.clone();
            }
            if edge.source == edge.target {
                return None;
            }
            seen.insert((edge.source.clone(), edge.target.clone(), edge.edge_type))
                .then_some(edge)
        })
        .collect()
}
