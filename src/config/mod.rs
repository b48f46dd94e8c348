//! Runtime configuration, loaded from environment variables with development
//! defaults.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{DEFAULT_CAPACITY, DEFAULT_TTL_MS};
use crate::fetcher::{DEFAULT_USER_AGENT, FetcherConfig};
use crate::parser::ParserOptions;
use crate::validators::{DEFAULT_THRESHOLD, FilterOptions};

pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_CACHE_CAPACITY: &str = "CACHE_CAPACITY";
pub const ENV_CACHE_TTL_MS: &str = "CACHE_TTL_MS";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";
pub const ENV_MAX_REDIRECTS: &str = "MAX_REDIRECTS";
pub const ENV_BROWSER_TIMEOUT_SECS: &str = "BROWSER_TIMEOUT_SECS";
pub const ENV_USER_AGENT: &str = "USER_AGENT";
pub const ENV_MAX_NODES: &str = "MAX_NODES";
pub const ENV_DEDUP_THRESHOLD: &str = "DEDUP_THRESHOLD";
pub const ENV_RATE_LIMIT_MAX_REQUESTS: &str = "RATE_LIMIT_MAX_REQUESTS";
pub const ENV_RATE_LIMIT_WINDOW_SECS: &str = "RATE_LIMIT_WINDOW_SECS";
pub const ENV_MAX_BROWSER_SESSIONS: &str = "MAX_BROWSER_SESSIONS";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_REDIRECTS: usize = 3;
const DEFAULT_BROWSER_TIMEOUT_SECS: u64 = 45;
const DEFAULT_MAX_NODES: usize = 50;
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 30;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: i64 = 60;
const DEFAULT_MAX_BROWSER_SESSIONS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    bind_addr: String,
    cache_capacity: usize,
    cache_ttl_ms: i64,
    fetch_timeout_secs: u64,
    max_redirects: usize,
    browser_timeout_secs: u64,
    user_agent: String,
    max_nodes: usize,
    dedup_threshold: f64,
    rate_limit_max_requests: u32,
    rate_limit_window_secs: i64,
    max_browser_sessions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            cache_capacity: DEFAULT_CAPACITY,
            cache_ttl_ms: DEFAULT_TTL_MS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            browser_timeout_secs: DEFAULT_BROWSER_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_nodes: DEFAULT_MAX_NODES,
            dedup_threshold: DEFAULT_THRESHOLD,
            rate_limit_max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            rate_limit_window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
            max_browser_sessions: DEFAULT_MAX_BROWSER_SESSIONS,
        }
    }
}

fn parse_var<T>(field: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(field) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            field,
            reason: format!("{raw:?}: {e}"),
        }),
        Err(_) => Ok(default),
    }
}

fn positive<T: PartialOrd + Default>(field: &'static str, value: T) -> Result<T, ConfigError> {
    if value > T::default() {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: "must be greater than zero".to_string(),
        })
    }
}

impl Config {
    /// Load from environment variables, falling back to development defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let dedup_threshold = parse_var(ENV_DEDUP_THRESHOLD, defaults.dedup_threshold)?;
        if !(0.0..=1.0).contains(&dedup_threshold) {
            return Err(ConfigError::InvalidValue {
                field: ENV_DEDUP_THRESHOLD,
                reason: "must be between 0 and 1".to_string(),
            });
        }

        Ok(Self {
            bind_addr: env::var(ENV_BIND_ADDR).unwrap_or(defaults.bind_addr),
            cache_capacity: positive(
                ENV_CACHE_CAPACITY,
                parse_var(ENV_CACHE_CAPACITY, defaults.cache_capacity)?,
            )?,
            cache_ttl_ms: positive(ENV_CACHE_TTL_MS, parse_var(ENV_CACHE_TTL_MS, defaults.cache_ttl_ms)?)?,
            fetch_timeout_secs: positive(
                ENV_FETCH_TIMEOUT_SECS,
                parse_var(ENV_FETCH_TIMEOUT_SECS, defaults.fetch_timeout_secs)?,
            )?,
            max_redirects: parse_var(ENV_MAX_REDIRECTS, defaults.max_redirects)?,
            browser_timeout_secs: positive(
                ENV_BROWSER_TIMEOUT_SECS,
                parse_var(ENV_BROWSER_TIMEOUT_SECS, defaults.browser_timeout_secs)?,
            )?,
            user_agent: env::var(ENV_USER_AGENT).unwrap_or(defaults.user_agent),
            max_nodes: positive(ENV_MAX_NODES, parse_var(ENV_MAX_NODES, defaults.max_nodes)?)?,
            dedup_threshold,
            rate_limit_max_requests: positive(
                ENV_RATE_LIMIT_MAX_REQUESTS,
                parse_var(ENV_RATE_LIMIT_MAX_REQUESTS, defaults.rate_limit_max_requests)?,
            )?,
            rate_limit_window_secs: positive(
                ENV_RATE_LIMIT_WINDOW_SECS,
                parse_var(ENV_RATE_LIMIT_WINDOW_SECS, defaults.rate_limit_window_secs)?,
            )?,
            max_browser_sessions: positive(
                ENV_MAX_BROWSER_SESSIONS,
                parse_var(ENV_MAX_BROWSER_SESSIONS, defaults.max_browser_sessions)?,
            )?,
        })
    }

    /// TCP bind address (host:port) for the HTTP server.
    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }
    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.cache_ttl_ms)
    }
    pub fn rate_limit_max_requests(&self) -> u32 {
        self.rate_limit_max_requests
    }
    pub fn rate_limit_window_secs(&self) -> i64 {
        self.rate_limit_window_secs
    }
    /// Upper bound on concurrent headless-browser fetches.
    pub fn max_browser_sessions(&self) -> usize {
        self.max_browser_sessions
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.fetch_timeout_secs),
            max_redirects: self.max_redirects,
            browser_timeout: Duration::from_secs(self.browser_timeout_secs),
            ..FetcherConfig::default()
        }
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            dedup_threshold: self.dedup_threshold,
            filter: FilterOptions {
                max_nodes: self.max_nodes,
                ..FilterOptions::default()
            },
            ..ParserOptions::default()
        }
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}
