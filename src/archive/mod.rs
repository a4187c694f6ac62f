//! Page archival
//!
//! Archivers receive every fetched document. Archival is best effort: the
//! page processor logs failures as warnings and carries on.
//!
//! # Components
//!
//! - `LocalArchiver`: Writes raw bodies under a per-run timestamped directory
//! - `WaybackArchiver`: Asks the Wayback Machine to snapshot the page

mod local;
mod wayback;

pub use local::{sanitize_filename, LocalArchiver};
pub use wayback::WaybackArchiver;

use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by archivers
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to write archive file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archive request for {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("archive service returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },
}

/// Stores a copy of a fetched document
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Short name used in log messages
    fn name(&self) -> &str;

    async fn archive(&self, url: &str, body: &str) -> Result<(), ArchiveError>;
}

/// Builds the archivers enabled by the configuration
///
/// The Wayback archiver reuses `client` so requests carry the crawler's
/// user agent.
pub fn build_archivers(config: &Config, client: Client) -> Vec<Arc<dyn Archiver>> {
    let mut archivers: Vec<Arc<dyn Archiver>> = Vec::new();

    if config.archive.local {
        archivers.push(Arc::new(LocalArchiver::with_current_time(
            &config.archive.directory,
        )));
    }

    if config.crawler.auto_archive {
        archivers.push(Arc::new(WaybackArchiver::new(
            client,
            &config.archive.wayback_endpoint,
            Duration::from_secs(config.archive.timeout),
        )));
    }

    archivers
}
