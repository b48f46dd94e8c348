//! SSRF guard applied to every URL the fetchers are asked to touch, including
//! each redirect hop.

use serde::Serialize;
use std::net::{Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

use crate::fetcher::errors::FetchError;

const PRIVATE_PREFIXES: [&str; 2] = ["10.", "192.168."];
const DOC_PATH_MARKERS: [&str; 4] = ["/docs", "/api", "/guide", "/reference"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn validate_url(url: &str) -> UrlValidation {
    match check_url(url) {
        Ok(_) => UrlValidation {
            valid: true,
            error: None,
        },
        Err(err) => UrlValidation {
            valid: false,
            error: Some(err.to_string()),
        },
    }
}

/// Parses and validates `url`, returning the parsed form on success.
pub fn check_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url)?;
    check_parsed(&parsed)?;
    Ok(parsed)
}

pub fn check_parsed(url: &Url) -> Result<(), FetchError> {
    if url.scheme() != "https" {
        return Err(FetchError::InvalidUrl(format!(
            "only https urls are allowed, got {}",
            url.scheme()
        )));
    }

    let host = url
        .host()
        .ok_or_else(|| FetchError::InvalidUrl("url has no host".to_string()))?;

    let blocked = match host {
        Host::Domain(domain) => is_blocked_hostname(domain),
        Host::Ipv4(ip) => is_blocked_ipv4(ip),
        Host::Ipv6(ip) => is_blocked_ipv6(ip),
    };

    if blocked {
        return Err(FetchError::BlockedUrl(url.host_str().unwrap_or_default().to_string()));
    }

    Ok(())
}

fn is_blocked_hostname(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == "localhost"
        || host.ends_with(".localhost")
        || host.starts_with("127.")
        || PRIVATE_PREFIXES.iter().any(|p| host.starts_with(p))
        || is_private_172(&host)
}

fn is_blocked_ipv4(ip: Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_unspecified() || is_blocked_hostname(&ip.to_string())
}

fn is_blocked_ipv6(ip: Ipv6Addr) -> bool {
    ip.is_loopback() || ip.is_unspecified()
}

/// `172.16.` through `172.31.`
pub(crate) fn is_private_172(host: &str) -> bool {
    let Some(rest) = host.strip_prefix("172.") else {
        return false;
    };
    rest.split('.')
        .next()
        .and_then(|octet| octet.parse::<u8>().ok())
        .is_some_and(|octet| (16..=31).contains(&octet))
}

/// Heuristic for pages worth spinning up a browser for.
pub fn looks_like_documentation(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    let host_is_docs = url
        .host_str()
        .is_some_and(|h| h.to_ascii_lowercase().starts_with("docs."));

    host_is_docs || DOC_PATH_MARKERS.iter().any(|marker| path.contains(marker))
}
