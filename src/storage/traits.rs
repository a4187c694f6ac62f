//! Storage traits and error types
//!
//! This module defines the trait interface for graph storage backends and
//! associated error types.

use crate::output::{Edge, Node};
use crate::storage::{RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("No crawl runs found in database")]
    NoRuns,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for link-graph storage backends
pub trait GraphStore {
    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recently started run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run finished with the given status
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    // ===== Graph Records =====

    /// Stores a node for a run
    fn insert_node(&mut self, run_id: i64, node: &Node) -> StorageResult<()>;

    /// Stores an edge for a run, flagged when it is a first edge
    fn insert_edge(&mut self, run_id: i64, edge: &Edge, is_first: bool) -> StorageResult<()>;

    // ===== Statistics =====

    fn count_nodes(&self, run_id: i64) -> StorageResult<u64>;

    fn count_edges(&self, run_id: i64) -> StorageResult<u64>;

    fn count_first_edges(&self, run_id: i64) -> StorageResult<u64>;

    /// Counts nodes that have no first edge (pages without outlinks)
    fn count_dead_ends(&self, run_id: i64) -> StorageResult<u64>;

    /// Returns the most linked-to targets with their in-degree
    fn top_targets(&self, run_id: i64, limit: usize) -> StorageResult<Vec<(String, u64)>>;
}
