use std::sync::Arc;

use crate::{
    cache::HtmlCache,
    config::Config,
    fetcher::{FetchError, Fetcher},
    generator::Generator,
    parser::DocumentationParser,
};

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<Generator>,
}

impl AppState {
    pub fn new(generator: Generator) -> Self {
        Self {
            generator: Arc::new(generator),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let cache = Arc::new(HtmlCache::with_ttl(config.cache_capacity(), config.cache_ttl()));
        let fetcher = Fetcher::new(config.fetcher_config())?;
        let parser = DocumentationParser::new(config.parser_options());

        Ok(Self::new(Generator::new(
            cache,
            fetcher,
            parser,
            config.max_browser_sessions(),
        )))
    }

    pub fn cache(&self) -> &HtmlCache {
        self.generator.cache()
    }
}
