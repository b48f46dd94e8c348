//! Runs the strategy chain over a page and pushes the winner through the
//! validator chain.

use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::graph::ParseResult;
use crate::strategies::Strategy;
use crate::validators::{
    DEFAULT_THRESHOLD, FilterOptions, deduplicate_nodes, filter_nodes, prune_edges,
    sanitize_nodes, update_edge_references,
};

pub const MIN_CONFIDENCE: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct ParserOptions {
    pub dedup_threshold: f64,
    pub min_confidence: f64,
    pub filter: FilterOptions,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            dedup_threshold: DEFAULT_THRESHOLD,
            min_confidence: MIN_CONFIDENCE,
            filter: FilterOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentationParser {
    options: ParserOptions,
}

impl DocumentationParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    pub fn available_strategies(&self) -> Vec<&'static str> {
        Strategy::ALL.iter().map(Strategy::name).collect()
    }

    /// The strategy that would be tried first for this page, without extracting anything.
    pub fn detect_strategy(&self, html: &str, url: &str) -> &'static str {
        Strategy::ALL
            .iter()
            .find(|s| s.can_handle(html, url))
            .unwrap_or(&Strategy::Heuristic)
            .name()
    }

    #[instrument(skip_all, fields(url = %url))]
    pub async fn parse_documentation(&self, html: &str, url: &str) -> ParseResult {
        let started = Instant::now();
        let mut warnings = Vec::new();

        let mut result = self.run_strategies(html, url, &mut warnings);
        let strategy = result.metadata.strategy.clone();

        let nodes_extracted = result.nodes.len();
        let edges_extracted = result.edges.len();

        let deduped = deduplicate_nodes(std::mem::take(&mut result.nodes), self.options.dedup_threshold);
        let nodes_deduplicated = nodes_extracted - deduped.nodes.len();
        let edges = update_edge_references(std::mem::take(&mut result.edges), &deduped.id_mapping);

        let before_filter = deduped.nodes.len();
        let nodes = filter_nodes(deduped.nodes, &self.options.filter);
        let nodes_filtered = before_filter - nodes.len();
        if before_filter > self.options.filter.max_nodes && nodes.len() == self.options.filter.max_nodes {
            warnings.push(format!(
                "node count capped at {} by priority",
                self.options.filter.max_nodes
            ));
        }

        let edges = prune_edges(edges, &nodes);
        let nodes = sanitize_nodes(nodes);

        if nodes.is_empty() {
            warnings.push("no documentation structure could be extracted".to_string());
        }

        let stats = &mut result.metadata.stats;
        stats.nodes_extracted = nodes_extracted;
        stats.edges_extracted = edges_extracted;
        stats.nodes_deduplicated = nodes_deduplicated;
        stats.nodes_filtered = nodes_filtered;
        stats.nodes_final = nodes.len();
        stats.edges_final = edges.len();
        stats.duration_ms = started.elapsed().as_millis() as u64;
        result.metadata.warnings.extend(warnings);

        info!(
            strategy = %strategy,
            confidence = result.metadata.confidence,
            nodes = nodes.len(),
            edges = edges.len(),
            "parsed documentation"
        );

        result.nodes = nodes;
        result.edges = edges;
        result
    }

    /// First applicable strategy whose result clears the confidence bar, falling back
    /// to the heuristic strategy.
    fn run_strategies(&self, html: &str, url: &str, warnings: &mut Vec<String>) -> ParseResult {
        for strategy in Strategy::ALL {
            if strategy == Strategy::Heuristic || !strategy.can_handle(html, url) {
                continue;
            }

            match strategy.parse(html, url) {
                Ok(result) if result.metadata.confidence >= self.options.min_confidence => {
                    debug!(strategy = strategy.name(), "strategy accepted");
                    return result;
                }
                Ok(result) => {
                    warnings.push(format!(
                        "{} strategy confidence {:.2} below threshold",
                        strategy.name(),
                        result.metadata.confidence
                    ));
                }
                Err(err) => {
                    warn!(strategy = strategy.name(), error = %err, "strategy failed");
                    warnings.push(format!("{} strategy failed: {}", strategy.name(), err));
                }
            }
        }

        debug!("falling back to heuristic strategy");
        crate::strategies::heuristic::parse(html, url)
    }
}
