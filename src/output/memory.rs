use crate::output::traits::{Edge, GraphSink, Node, OutputResult};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Records {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    first_edges: Vec<Edge>,
}

/// In-memory graph sink
///
/// Clones share the same storage, so one handle can be given to the emitter
/// while another reads the streams back.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    records: Arc<Mutex<Records>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn nodes(&self) -> Vec<Node> {
        self.lock().nodes.clone()
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.lock().edges.clone()
    }

    pub fn first_edges(&self) -> Vec<Edge> {
        self.lock().first_edges.clone()
    }
}

impl GraphSink for MemoryGraph {
    fn name(&self) -> &str {
        "memory"
    }

    fn record_node(&mut self, node: &Node) -> OutputResult<()> {
        self.lock().nodes.push(node.clone());
        Ok(())
    }

    fn record_edge(&mut self, edge: &Edge) -> OutputResult<()> {
        self.lock().edges.push(edge.clone());
        Ok(())
    }

    fn record_first_edge(&mut self, edge: &Edge) -> OutputResult<()> {
        self.lock().first_edges.push(edge.clone());
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_records() {
        let graph = MemoryGraph::new();
        let mut sink = graph.clone();

        sink.record_node(&Node::new("a", "A")).unwrap();
        sink.record_edge(&Edge::new("a", "b")).unwrap();

        assert_eq!(graph.nodes(), vec![Node::new("a", "A")]);
        assert_eq!(graph.edges(), vec![Edge::new("a", "b")]);
        assert!(graph.first_edges().is_empty());
    }
}
