//! URL in, graph out: cache lookup, fetch, parse.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument};

use crate::cache::HtmlCache;
use crate::fetcher::{FetchError, Fetcher};
use crate::graph::ParseResult;
use crate::parser::DocumentationParser;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("browser sessions unavailable")]
    BrowserUnavailable,
}

impl GenerateError {
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Fetch(err) => err.should_retry(),
            Self::BrowserUnavailable => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    /// Render the page in a headless browser instead of a plain GET.
    pub render_js: bool,
    /// Skip the cache lookup. The fresh page still replaces the cached copy.
    pub bypass_cache: bool,
}

pub struct Generator {
    cache: Arc<HtmlCache>,
    fetcher: Fetcher,
    parser: DocumentationParser,
    browser_sessions: Arc<Semaphore>,
}

impl Generator {
    pub fn new(
        cache: Arc<HtmlCache>,
        fetcher: Fetcher,
        parser: DocumentationParser,
        max_browser_sessions: usize,
    ) -> Self {
        Self {
            cache,
            fetcher,
            parser,
            browser_sessions: Arc::new(Semaphore::new(max_browser_sessions)),
        }
    }

    pub fn cache(&self) -> &Arc<HtmlCache> {
        &self.cache
    }

    pub fn parser(&self) -> &DocumentationParser {
        &self.parser
    }

    #[instrument(skip_all, fields(url = %url, render_js = options.render_js))]
    pub async fn generate(&self, url: &str, options: GenerateOptions) -> Result<ParseResult, GenerateError> {
        let html = self.page_html(url, options).await?;
        Ok(self.parser.parse_documentation(&html, url).await)
    }

    async fn page_html(&self, url: &str, options: GenerateOptions) -> Result<String, GenerateError> {
        if !options.bypass_cache
            && let Some(html) = self.cache.get(url)
        {
            debug!("cache hit");
            return Ok(html);
        }

        let fetched = if options.render_js {
            let _permit = self
                .browser_sessions
                .acquire()
                .await
                .map_err(|_| GenerateError::BrowserUnavailable)?;
            self.fetcher.fetch_with_browser(url).await?
        } else {
            self.fetcher.fetch_documentation(url).await?
        };

        info!(
            final_url = %fetched.final_url,
            status = fetched.status,
            bytes = fetched.html.len(),
            rendered = fetched.rendered,
            "fetched page"
        );

        self.cache.set(url, fetched.html.clone());
        Ok(fetched.html)
    }
}
