//! Configuration module for Wiki-Cartographer
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and reading the seed-URL list that starts a crawl.
//!
//! # Example
//!
//! ```no_run
//! use wiki_cartographer::config::{load_config, load_seeds};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! let seeds = load_seeds(Path::new("seeds.txt")).unwrap();
//! println!("Crawling {} seeds to depth {}", seeds.len(), config.crawler.depth_limit);
//! ```

mod parser;
mod seeds;
mod types;
mod validation;

// Re-export types
pub use types::{
    ArchiveConfig, Config, CrawlerConfig, LogLevel, OutputConfig, ThrottleConfig,
    UserAgentConfig, WikiConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use seeds::{load_seeds, parse_seeds};
