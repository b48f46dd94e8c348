use regex::Regex;
use std::sync::LazyLock;

pub const MIN_LABEL_LENGTH: usize = 3;
pub const MAX_LABEL_LENGTH: usize = 100;

static WHITESPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Failed to compile whitespace regex"));

/// Decodes named and numeric HTML entities (`&amp;`, `&#39;`, `&#x2014;`, ...).
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Collapses every whitespace run (including newlines) to a single space and trims.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text.trim(), " ").into_owned()
}

/// Removes control characters, turning line breaks and tabs into spaces first.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\n' || c == '\r' || c == '\t' { ' ' } else { c })
        .filter(|c| !c.is_control())
        .collect()
}

pub fn sanitize_text(text: &str) -> String {
    normalize_whitespace(&strip_control_chars(&decode_entities(text)))
}

pub fn is_valid_label(label: &str) -> bool {
    let len = label.chars().count();
    (MIN_LABEL_LENGTH..=MAX_LABEL_LENGTH).contains(&len)
}

/// Sanitized label, or `None` when the cleaned text falls outside the label length bounds.
pub fn clean_label(raw: &str) -> Option<String> {
    let label = sanitize_text(raw);
    is_valid_label(&label).then_some(label)
}
