use crate::graph::model::NodeType;

/// Lowercase, with every run of non-alphanumeric characters collapsed into a single `-`.
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut pending_dash = false;

    for ch in label.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }

    slug
}

pub fn node_id(node_type: NodeType, label: &str) -> String {
    format!("{}-{}", node_type.as_str(), slugify(label))
}

pub fn edge_id(source: &str, target: &str) -> String {
    format!("edge-{}-{}", source, target)
}
