use crate::output::traits::{Edge, GraphSink, Node, OutputResult};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Feed file names inside the feeds directory
pub const NODES_FILE: &str = "nodes.csv";
pub const FIRST_EDGES_FILE: &str = "first_edges.csv";
pub const EDGES_FILE: &str = "edges.csv";

const NODE_HEADERS: [&str; 2] = ["id", "label"];
const EDGE_HEADERS: [&str; 2] = ["source", "target"];

/// Writes the three graph streams as CSV feeds
///
/// `nodes.csv` has columns `id,label`; `first_edges.csv` and `edges.csv`
/// have `source,target`. Files are truncated when the sink is created.
pub struct CsvGraphSink {
    dir: PathBuf,
    nodes: csv::Writer<File>,
    first_edges: csv::Writer<File>,
    edges: csv::Writer<File>,
}

impl CsvGraphSink {
    pub fn create(dir: &Path) -> OutputResult<Self> {
        fs::create_dir_all(dir)?;

        Ok(Self {
            dir: dir.to_path_buf(),
            nodes: open_feed(&dir.join(NODES_FILE), &NODE_HEADERS)?,
            first_edges: open_feed(&dir.join(FIRST_EDGES_FILE), &EDGE_HEADERS)?,
            edges: open_feed(&dir.join(EDGES_FILE), &EDGE_HEADERS)?,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn open_feed(path: &Path, headers: &[&str]) -> OutputResult<csv::Writer<File>> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(headers)?;
    Ok(writer)
}

impl GraphSink for CsvGraphSink {
    fn name(&self) -> &str {
        "csv"
    }

    fn record_node(&mut self, node: &Node) -> OutputResult<()> {
        self.nodes.write_record([&node.id, &node.label])?;
        Ok(())
    }

    fn record_edge(&mut self, edge: &Edge) -> OutputResult<()> {
        self.edges.write_record([&edge.source, &edge.target])?;
        Ok(())
    }

    fn record_first_edge(&mut self, edge: &Edge) -> OutputResult<()> {
        self.first_edges
            .write_record([&edge.source, &edge.target])?;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.nodes.flush()?;
        self.first_edges.flush()?;
        self.edges.flush()?;
        Ok(())
    }
}
