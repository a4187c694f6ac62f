//! Statistics generation from the graph database
//!
//! This module provides functionality for extracting and displaying
//! link-graph statistics from the storage layer.

use crate::storage::{GraphStore, RunRecord, StorageError, StorageResult};

/// Number of most linked-to pages listed in the statistics
const TOP_TARGETS: usize = 10;

/// Graph statistics for one crawl run
#[derive(Debug, Clone)]
pub struct GraphStatistics {
    /// The run these numbers describe
    pub run: RunRecord,

    /// Number of processed pages
    pub nodes: u64,

    /// Number of edges, first edges included
    pub edges: u64,

    /// Number of first edges
    pub first_edges: u64,

    /// Pages that produced no first edge
    pub dead_ends: u64,

    /// Most linked-to targets with their in-degree
    pub top_targets: Vec<(String, u64)>,
}

impl GraphStatistics {
    /// Average number of outgoing edges per processed page
    pub fn mean_out_degree(&self) -> f64 {
        if self.nodes == 0 {
            return 0.0;
        }
        self.edges as f64 / self.nodes as f64
    }
}

/// Loads statistics for the latest run from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(GraphStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - No runs recorded, or a query failed
pub fn load_statistics(storage: &dyn GraphStore) -> StorageResult<GraphStatistics> {
    let run = storage.get_latest_run()?.ok_or(StorageError::NoRuns)?;

    Ok(GraphStatistics {
        nodes: storage.count_nodes(run.id)?,
        edges: storage.count_edges(run.id)?,
        first_edges: storage.count_first_edges(run.id)?,
        dead_ends: storage.count_dead_ends(run.id)?,
        top_targets: storage.top_targets(run.id, TOP_TARGETS)?,
        run,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &GraphStatistics) {
    println!("=== Link Graph Statistics ===\n");

    println!("Run #{}:", stats.run.id);
    println!("  Status: {}", stats.run.status.to_db_string());
    println!("  Started: {}", stats.run.started_at);
    if let Some(finished) = &stats.run.finished_at {
        println!("  Finished: {}", finished);
    }
    println!("  Config hash: {}", stats.run.config_hash);
    println!();

    println!("Graph:");
    println!("  Nodes: {}", stats.nodes);
    println!("  Edges: {}", stats.edges);
    println!("  First edges: {}", stats.first_edges);
    println!("  Pages without outlinks: {}", stats.dead_ends);
    println!("  Mean out-degree: {:.2}", stats.mean_out_degree());
    println!();

    if !stats.top_targets.is_empty() {
        println!("Most Linked Pages:");
        for (target, inbound) in &stats.top_targets {
            println!("  {:>6}  {}", inbound, target);
        }
    }
}
