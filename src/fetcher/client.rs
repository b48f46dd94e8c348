use chrono::Utc;
use reqwest::{Client, ClientBuilder, header};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::fetcher::{
    browser,
    errors::FetchError,
    pipeline::{decode_body, is_supported_content_type},
    types::FetchResult,
    validate::{check_parsed, looks_like_documentation},
};

pub const DEFAULT_USER_AGENT: &str = "DocmapBot/0.1 (+https://docmap.example.com/bot)";
const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub max_redirects: usize,
    pub max_body_size: u64,
    pub browser_timeout: Duration,
    pub browser_settle: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(10),
            max_redirects: 3,
            max_body_size: MAX_BODY_SIZE,
            browser_timeout: Duration::from_secs(45),
            browser_settle: Duration::from_secs(2),
        }
    }
}

/// HTTP fetcher with SSRF validation on the initial URL and on every redirect hop.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
    trusted_origin: Option<url::Origin>,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            // redirects are followed by hand so each hop can be re-validated
            .redirect(reqwest::redirect::Policy::none())
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::ACCEPT,
                    header::HeaderValue::from_static(
                        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                    ),
                );
                headers
            })
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            config,
            trusted_origin: None,
        })
    }

    /// Exempts one origin from the SSRF guard, so tests can reach a local mock server.
    /// Every other URL, redirect targets included, is still checked.
    #[doc(hidden)]
    pub fn with_trusted_origin(mut self, origin: &str) -> Result<Self, FetchError> {
        self.trusted_origin = Some(Url::parse(origin)?.origin());
        Ok(self)
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    fn guard(&self, url: &Url) -> Result<(), FetchError> {
        if self.trusted_origin.as_ref() == Some(&url.origin()) {
            return Ok(());
        }
        check_parsed(url)
    }

    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_documentation(&self, url: &str) -> Result<FetchResult, FetchError> {
        let requested = Url::parse(url)?;
        self.guard(&requested)?;

        let mut current = requested.clone();
        let mut redirects = 0;

        let response = loop {
            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(FetchError::from_reqwest_error)?;

            let status = response.status();
            if !status.is_redirection() {
                break response;
            }

            if redirects >= self.config.max_redirects {
                return Err(FetchError::TooManyRedirects(self.config.max_redirects));
            }

            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|value| value.to_str().ok())
                .ok_or(FetchError::MissingLocation)?;
            let next = current.join(location)?;
            self.guard(&next)?;

            debug!(from = %current, to = %next, status = status.as_u16(), "following redirect");
            current = next;
            redirects += 1;
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status));
        }

        if let Some(content_length) = response.content_length()
            && content_length > self.config.max_body_size
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        if !is_supported_content_type(&content_type) {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        let body = response
            .bytes()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        // Content-Length may be missing or wrong
        if body.len() as u64 > self.config.max_body_size {
            return Err(FetchError::BodyTooLarge(body.len() as u64));
        }

        let decoded = decode_body(&content_type, &body)?;
        debug!(
            status = status.as_u16(),
            redirects,
            bytes = body.len(),
            charset = decoded.charset,
            "fetched documentation page"
        );

        Ok(FetchResult {
            url: requested,
            final_url: current,
            html: decoded.html,
            status: status.as_u16(),
            content_type,
            charset: decoded.charset.to_string(),
            redirects,
            rendered: false,
            fetched_at: Utc::now(),
        })
    }

    /// Renders the page in a headless browser, for documentation sites that build their
    /// navigation client-side.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_with_browser(&self, url: &str) -> Result<FetchResult, FetchError> {
        let requested = Url::parse(url)?;
        self.guard(&requested)?;

        if !looks_like_documentation(&requested) {
            return Err(FetchError::NotDocumentationUrl(url.to_string()));
        }

        let html = browser::render(&requested, &self.config).await?;

        Ok(FetchResult {
            final_url: requested.clone(),
            url: requested,
            html,
            status: 200,
            content_type: "text/html".to_string(),
            charset: "UTF-8".to_string(),
            redirects: 0,
            rendered: true,
            fetched_at: Utc::now(),
        })
    }
}
