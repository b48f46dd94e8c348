//! Final cleanup of node text and links before a result leaves the parser.

use regex::Regex;
use std::sync::LazyLock;
use url::{Host, Url};

use crate::fetcher::validate::is_private_172;
use crate::graph::{ExtractedNode, Link, text::sanitize_text};

pub const MAX_DESCRIPTION_LENGTH: usize = 200;
const ELLIPSIS: &str = "...";

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("Failed to compile script regex")
});
static SCRIPT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?script\b[^>]*>").expect("Failed to compile script tag regex"));
static EVENT_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\son[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#)
        .expect("Failed to compile event handler regex")
});
static JAVASCRIPT_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript\s*:").expect("Failed to compile javascript url regex"));

/// Whether a link may be kept on a node: https to a public host.
///
/// This differs slightly from the fetcher's SSRF guard: link-local `169.254.` hosts are
/// rejected here, while IPv6 loopback and `0.0.0.0` are only rejected by the fetcher.
pub fn is_valid_link_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if parsed.scheme() != "https" {
        return false;
    }

    let host = match parsed.host() {
        Some(Host::Domain(domain)) => domain.to_ascii_lowercase(),
        Some(Host::Ipv4(ip)) => ip.to_string(),
        Some(Host::Ipv6(_)) => return true,
        None => return false,
    };

    !(host == "localhost"
        || host.starts_with("127.")
        || host.starts_with("10.")
        || host.starts_with("192.168.")
        || host.starts_with("169.254.")
        || is_private_172(&host))
}

/// Cuts to at most `MAX_DESCRIPTION_LENGTH` chars, at a word boundary when one is
/// reasonably close to the limit.
pub fn truncate_description(text: &str) -> String {
    if text.chars().count() <= MAX_DESCRIPTION_LENGTH {
        return text.to_string();
    }

    let budget = MAX_DESCRIPTION_LENGTH - ELLIPSIS.len();
    let cut: String = text.chars().take(budget).collect();

    let trimmed = match cut.rfind(char::is_whitespace) {
        Some(boundary) if cut[..boundary].chars().count() >= budget / 2 => {
            cut[..boundary].trim_end()
        }
        _ => cut.as_str(),
    };

    format!("{trimmed}{ELLIPSIS}")
}

fn clean_optional(text: Option<String>) -> Option<String> {
    text.map(|t| sanitize_text(&t)).filter(|t| !t.is_empty())
}

pub fn sanitize_node(mut node: ExtractedNode) -> ExtractedNode {
    let data = &mut node.data;

    data.label = sanitize_text(&data.label);
    data.description = clean_optional(data.description.take()).map(|d| truncate_description(&d));
    data.icon = clean_optional(data.icon.take());
    data.color = clean_optional(data.color.take());
    data.doc_url = data
        .doc_url
        .take()
        .map(|u| u.trim().to_string())
        .filter(|u| is_valid_link_url(u));

    data.tags = data
        .tags
        .take()
        .map(|tags| {
            tags.iter()
                .map(|t| sanitize_text(t))
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|tags| !tags.is_empty());

    data.additional_links = data
        .additional_links
        .take()
        .map(|links| {
            links
                .into_iter()
                .filter(|link| is_valid_link_url(link.url.trim()))
                .map(|link| Link {
                    title: sanitize_text(&link.title),
                    url: link.url.trim().to_string(),
                })
                .collect::<Vec<_>>()
        })
        .filter(|links| !links.is_empty());

    node
}

pub fn sanitize_nodes(nodes: Vec<ExtractedNode>) -> Vec<ExtractedNode> {
    nodes.into_iter().map(sanitize_node).collect()
}

/// Strips `<script>` blocks, inline event handlers and `javascript:` URLs from text.
///
/// Not part of the default pipeline; callers that render labels as HTML can apply it.
pub fn remove_dangerous_content(text: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(text, "");
    let text = SCRIPT_TAG.replace_all(&text, "");
    let text = EVENT_HANDLER.replace_all(&text, "");
    JAVASCRIPT_URL.replace_all(&text, "").into_owned()
}

fn contains_dangerous_content(text: &str) -> bool {
    SCRIPT_TAG.is_match(text) || EVENT_HANDLER.is_match(text) || JAVASCRIPT_URL.is_match(text)
}

pub fn is_node_safe(node: &ExtractedNode) -> bool {
    let data = &node.data;
    let texts = std::iter::once(data.label.as_str())
        .chain(data.description.as_deref())
        .chain(data.doc_url.as_deref())
        .chain(data.icon.as_deref())
        .chain(data.tags.iter().flatten().map(String::as_str))
        .chain(
            data.additional_links
                .iter()
                .flatten()
                .flat_map(|l| [l.title.as_str(), l.url.as_str()]),
        );

    !texts.into_iter().any(contains_dangerous_content)
}
