//! Graph record types and the sink trait
//!
//! This module defines the three record kinds a crawl produces and the trait
//! every output destination implements.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Label used when a page has no extractable title
pub const NO_TITLE: &str = "No title";

/// A processed page in the link graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Node {
    /// Canonical URL of the page
    pub id: String,

    /// Page title, or [`NO_TITLE`]
    pub label: String,
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    /// Builds a node, falling back to [`NO_TITLE`] when the title is missing
    pub fn with_title(id: impl Into<String>, title: Option<String>) -> Self {
        Self::new(id, title.unwrap_or_else(|| NO_TITLE.to_string()))
    }
}

/// A directed hyperlink (or redirect hop) between two URLs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Trait for graph output destinations
///
/// Sinks receive records in emission order and must not reorder or dedupe
/// them. The emitter serializes all calls, so implementations only need to
/// be `Send`.
pub trait GraphSink: Send {
    /// Short name used in log messages
    fn name(&self) -> &str;

    /// Records a processed page
    fn record_node(&mut self, node: &Node) -> OutputResult<()>;

    /// Records an edge
    fn record_edge(&mut self, edge: &Edge) -> OutputResult<()>;

    /// Records a first edge
    ///
    /// The emitter also passes the same edge to [`GraphSink::record_edge`].
    fn record_first_edge(&mut self, edge: &Edge) -> OutputResult<()>;

    /// Persists buffered records
    fn flush(&mut self) -> OutputResult<()>;
}
