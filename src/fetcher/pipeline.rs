//! Turns raw response bytes into UTF-8 HTML.

use encoding_rs::Encoding;
use regex::Regex;
use std::sync::LazyLock;

use crate::fetcher::errors::FetchError;

const SNIFF_WINDOW: usize = 4096;

static HEADER_CHARSET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).expect("Failed to compile charset regex")
});

static META_CHARSET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>;]+)"#)
        .expect("Failed to compile meta charset regex")
});

#[derive(Debug)]
pub struct DecodedBody {
    pub html: String,
    pub charset: &'static str,
}

pub fn decode_body(content_type: &str, body: &[u8]) -> Result<DecodedBody, FetchError> {
    let encoding = detect_encoding(content_type, body);
    let (decoded, used, had_errors) = encoding.decode(body);

    if had_errors {
        return Err(FetchError::Charset(format!(
            "failed to decode body as {}",
            used.name()
        )));
    }

    Ok(DecodedBody {
        html: decoded.into_owned(),
        charset: used.name(),
    })
}

/// Content-Type header first, then `<meta charset>` in the first few KB, then chardetng.
fn detect_encoding(content_type: &str, body: &[u8]) -> &'static Encoding {
    if let Some(encoding) = encoding_from(&HEADER_CHARSET_REGEX, content_type) {
        return encoding;
    }

    let window = &body[..body.len().min(SNIFF_WINDOW)];
    if let Some(encoding) = encoding_from(&META_CHARSET_REGEX, &String::from_utf8_lossy(window)) {
        return encoding;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(window, body.len() <= SNIFF_WINDOW);
    detector.guess(None, true)
}

fn encoding_from(regex: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let label = regex.captures(haystack)?.get(1)?.as_str().to_ascii_lowercase();
    Encoding::for_label(label.as_bytes())
}

/// HTML pages plus the JSON/XML documents the schema strategy can read directly.
pub fn is_supported_content_type(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    ct.starts_with("text/") || ct.contains("xhtml") || ct.contains("json") || ct.contains("xml")
}
