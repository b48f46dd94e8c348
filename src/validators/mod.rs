pub mod dedup;
pub mod filter;
pub mod sanitize;

pub use dedup::{DEFAULT_THRESHOLD, DedupOutcome, deduplicate_nodes, update_edge_references};
pub use filter::{FilterOptions, filter_nodes, prune_edges};
pub use sanitize::{is_node_safe, remove_dangerous_content, sanitize_node, sanitize_nodes};
