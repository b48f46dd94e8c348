pub mod browser;
pub mod client;
pub mod errors;
pub mod pipeline;
pub mod types;
pub mod validate;

pub use client::{DEFAULT_USER_AGENT, Fetcher, FetcherConfig};
pub use errors::FetchError;
pub use types::FetchResult;
pub use validate::{UrlValidation, check_url, validate_url};
