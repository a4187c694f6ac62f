//! Wiki-Cartographer: a wiki link-graph crawler
//!
//! This crate crawls a MediaWiki-style document collection, extracts the directed
//! graph of articles and their hyperlinks, and archives page content along the way.
//! Crawl output is three record streams: nodes, first edges and edges.

pub mod archive;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Wiki-Cartographer operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Extraction error for {url}: {source}")]
    Extract {
        url: String,
        source: crawler::ExtractError,
    },

    #[error("{url} redirected outside the allowed domains to {final_url}")]
    OffDomain { url: String, final_url: String },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Seed file {0} contains no seed URLs")]
    NoSeeds(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Wiki-Cartographer operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport};
pub use output::{Edge, GraphEmitter, Node};
pub use state::PageRequest;
pub use url::{canonicalize_url, LinkClassifier};
