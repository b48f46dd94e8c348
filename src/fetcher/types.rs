use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

/// HTML retrieved for a documentation URL, from either the HTTP or the browser path.
#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub url: Url,
    pub final_url: Url,
    pub html: String,
    pub status: u16,
    pub content_type: String,
    pub charset: String,
    pub redirects: usize,
    pub rendered: bool,
    pub fetched_at: DateTime<Utc>,
}
