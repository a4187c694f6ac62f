//! Output module for the link graph
//!
//! This module handles:
//! - The node, first-edge and edge record types
//! - Fanning records out to graph sinks (memory, CSV feeds, SQLite)
//! - Cleaning empty records out of CSV feeds
//! - Printing graph statistics from the database

mod cleanup;
mod csv_sink;
mod emitter;
mod memory;
pub mod stats;
mod traits;

pub use cleanup::{clean_feed, clean_feeds};
pub use csv_sink::{CsvGraphSink, EDGES_FILE, FIRST_EDGES_FILE, NODES_FILE};
pub use emitter::GraphEmitter;
pub use memory::MemoryGraph;
pub use stats::{load_statistics, print_statistics, GraphStatistics};
pub use traits::{Edge, GraphSink, Node, OutputError, OutputResult, NO_TITLE};
