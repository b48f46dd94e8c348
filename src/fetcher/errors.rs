use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("blocked url: {0}")]
    BlockedUrl(String),

    #[error("not a documentation url: {0}")]
    NotDocumentationUrl(String),

    #[error("page not found (404)")]
    NotFound,

    #[error("access forbidden (403)")]
    Forbidden,

    #[error("rate limited by upstream (429)")]
    RateLimited,

    #[error("http error {status}")]
    Http { status: reqwest::StatusCode },

    #[error("request timeout")]
    Timeout,

    #[error("network failure: {0}")]
    Network(String),

    #[error("too many redirects (limit {0})")]
    TooManyRedirects(usize),

    #[error("redirect without location header")]
    MissingLocation,

    #[error("body too large ({0} bytes)")]
    BodyTooLarge(u64),

    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),

    #[error("charset error: {0}")]
    Charset(String),

    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    #[error("browser error: {0}")]
    Browser(String),
}

impl FetchError {
    /// Whether a caller-side retry has a chance of succeeding. The fetcher itself never retries.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::InvalidUrl(_) => false,
            Self::BlockedUrl(_) => false,
            Self::NotDocumentationUrl(_) => false,
            Self::NotFound => false,
            Self::Forbidden => false,
            Self::TooManyRedirects(_) => false,
            Self::MissingLocation => false,
            Self::BodyTooLarge(_) => false,
            Self::UnsupportedContentType(_) => false,
            Self::Charset(_) => false,
            Self::Http { status } => status.is_server_error(),

            Self::RateLimited => true,
            Self::Timeout => true,
            Self::Network(_) => true,
            Self::BrowserLaunch(_) => true,
            Self::Browser(_) => true,
        }
    }

    /// Errors caused by the requested URL itself rather than the upstream site.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl(_) | Self::BlockedUrl(_) | Self::NotDocumentationUrl(_)
        )
    }

    pub fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            404 => Self::NotFound,
            403 => Self::Forbidden,
            429 => Self::RateLimited,
            _ => Self::Http { status },
        }
    }

    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::from_status(status)
        } else {
            // DNS, connection refused, TLS handshake, broken body stream
            Self::Network(err.to_string())
        }
    }
}

impl From<url::ParseError> for FetchError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}
