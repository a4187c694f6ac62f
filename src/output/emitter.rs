//! Graph emitter
//!
//! Fans every record out to the configured sinks in emission order. A failing
//! sink is logged and counted; it never stops the crawl or the other sinks.

use crate::output::traits::{Edge, GraphSink, Node, OutputResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::warn;

/// Append-only emitter for node, first-edge and edge records
#[derive(Default)]
pub struct GraphEmitter {
    sinks: Mutex<Vec<Box<dyn GraphSink>>>,
    nodes: AtomicU64,
    edges: AtomicU64,
    first_edges: AtomicU64,
    sink_errors: AtomicU64,
}

impl GraphEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink; records emitted earlier are not replayed
    pub fn add_sink(&self, sink: Box<dyn GraphSink>) {
        self.lock().push(sink);
    }

    pub fn with_sink(self, sink: Box<dyn GraphSink>) -> Self {
        self.add_sink(sink);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Box<dyn GraphSink>>> {
        self.sinks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fan_out<F>(&self, what: &str, mut write: F)
    where
        F: FnMut(&mut dyn GraphSink) -> OutputResult<()>,
    {
        let mut sinks = self.lock();
        for sink in sinks.iter_mut() {
            if let Err(e) = write(sink.as_mut()) {
                self.sink_errors.fetch_add(1, Ordering::Relaxed);
                warn!("Sink '{}' failed to record {}: {}", sink.name(), what, e);
            }
        }
    }

    pub fn emit_node(&self, node: &Node) {
        self.nodes.fetch_add(1, Ordering::Relaxed);
        self.fan_out("node", |sink| sink.record_node(node));
    }

    pub fn emit_edge(&self, edge: &Edge) {
        self.edges.fetch_add(1, Ordering::Relaxed);
        self.fan_out("edge", |sink| sink.record_edge(edge));
    }

    /// Emits a first edge; it is also emitted as a regular edge
    pub fn emit_first_edge(&self, edge: &Edge) {
        self.first_edges.fetch_add(1, Ordering::Relaxed);
        self.fan_out("first edge", |sink| sink.record_first_edge(edge));
        self.emit_edge(edge);
    }

    /// Flushes every sink
    pub fn flush(&self) {
        self.fan_out("flush", |sink| sink.flush());
    }

    pub fn node_count(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }

    pub fn edge_count(&self) -> u64 {
        self.edges.load(Ordering::Relaxed)
    }

    pub fn first_edge_count(&self) -> u64 {
        self.first_edges.load(Ordering::Relaxed)
    }

    pub fn sink_errors(&self) -> u64 {
        self.sink_errors.load(Ordering::Relaxed)
    }
}
