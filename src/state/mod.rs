//! State module for tracking crawl progress
//!
//! This module provides the shared state workers consult while crawling.
//!
//! # Components
//!
//! - `PageRequest`: A unit of work, a URL at a depth with its redirect history
//! - `VisitedSet`: URLs already admitted to the crawl
//! - `DomainState`: Per-domain adaptive delay used by the auto-throttle
//! - `CrawlStats`: Live counters reported by the progress logger

mod domain_state;
mod page_request;
mod stats;
mod visited;

// Re-export main types
pub use domain_state::DomainState;
pub use page_request::PageRequest;
pub use stats::{CrawlStats, StatsSnapshot};
pub use visited::VisitedSet;
