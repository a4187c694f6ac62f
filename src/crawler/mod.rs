//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with manual redirect following
//! - Per-domain auto-throttling
//! - Title and link extraction
//! - Redirect resolution of link targets
//! - The frontier and visited set
//! - Per-page processing and overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod processor;
mod resolver;
mod throttle;

pub use coordinator::{Coordinator, CrawlReport};
pub use fetcher::{build_http_client, FetchError, FetchedPage, HttpFetcher, PageFetcher};
pub use frontier::{Admission, Frontier};
pub use parser::{ExtractError, PageExtractor, ScraperExtractor};
pub use processor::{Discovery, EdgeRecord, PageProcessor, PageRecords};
pub use resolver::{RedirectResolver, Resolution};
pub use throttle::{AutoThrottle, ThrottledFetcher};

use crate::config::Config;
use std::sync::Arc;

/// Builds the production fetcher: reqwest with manual redirects behind the auto-throttle
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Arc<dyn PageFetcher>)` - Fetcher shared by page fetches and link resolution
/// * `Err(reqwest::Error)` - The HTTP client could not be built
pub fn build_fetcher(config: &Config) -> Result<Arc<dyn PageFetcher>, reqwest::Error> {
    let http = HttpFetcher::from_config(config)?;
    let throttle = Arc::new(AutoThrottle::new(config.throttle.clone()));
    Ok(Arc::new(ThrottledFetcher::new(http, throttle)))
}
