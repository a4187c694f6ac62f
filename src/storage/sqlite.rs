//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the GraphStore trait
//! and the graph sink that writes crawl records through it.

use crate::output::{Edge, GraphSink, Node, OutputError, OutputResult};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{GraphStore, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count(&self, sql: &str, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, params![run_id], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn run_from_row(row: &Row) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
    })
}

impl GraphStore for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Graph Records =====

    fn insert_node(&mut self, run_id: i64, node: &Node) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO nodes (run_id, url, label, recorded_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, node.id, node.label, now],
        )?;
        Ok(())
    }

    fn insert_edge(&mut self, run_id: i64, edge: &Edge, is_first: bool) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO edges (run_id, source, target, is_first) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, edge.source, edge.target, is_first],
        )?;
        Ok(())
    }

    // ===== Statistics =====

    fn count_nodes(&self, run_id: i64) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM nodes WHERE run_id = ?1", run_id)
    }

    fn count_edges(&self, run_id: i64) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM edges WHERE run_id = ?1", run_id)
    }

    fn count_first_edges(&self, run_id: i64) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM edges WHERE run_id = ?1 AND is_first = 1",
            run_id,
        )
    }

    fn count_dead_ends(&self, run_id: i64) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM nodes n WHERE n.run_id = ?1 AND NOT EXISTS (
                SELECT 1 FROM edges e
                WHERE e.run_id = n.run_id AND e.source = n.url AND e.is_first = 1
            )",
            run_id,
        )
    }

    fn top_targets(&self, run_id: i64, limit: usize) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT target, COUNT(*) AS inbound FROM edges WHERE run_id = ?1
             GROUP BY target ORDER BY inbound DESC, target ASC LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![run_id, limit as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;

        let mut targets = Vec::new();
        for row in rows {
            targets.push(row?);
        }
        Ok(targets)
    }
}

/// Graph sink that persists records for one run
///
/// A first edge is followed by the same edge as a regular edge; the pair is
/// stored as a single flagged row so `edges` mirrors the edge stream.
pub struct SqliteGraphSink {
    storage: SqliteStorage,
    run_id: i64,
    pending_first: Option<Edge>,
}

impl SqliteGraphSink {
    pub fn new(storage: SqliteStorage, run_id: i64) -> Self {
        Self {
            storage,
            run_id,
            pending_first: None,
        }
    }

    fn store_pending(&mut self) -> StorageResult<()> {
        if let Some(edge) = self.pending_first.take() {
            self.storage.insert_edge(self.run_id, &edge, true)?;
        }
        Ok(())
    }
}

fn to_output(e: StorageError) -> OutputError {
    OutputError::Storage(e.to_string())
}

impl GraphSink for SqliteGraphSink {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn record_node(&mut self, node: &Node) -> OutputResult<()> {
        self.store_pending().map_err(to_output)?;
        self.storage.insert_node(self.run_id, node).map_err(to_output)
    }

    fn record_edge(&mut self, edge: &Edge) -> OutputResult<()> {
        if self.pending_first.as_ref() == Some(edge) {
            return self.store_pending().map_err(to_output);
        }

        self.store_pending().map_err(to_output)?;
        self.storage
            .insert_edge(self.run_id, edge, false)
            .map_err(to_output)
    }

    fn record_first_edge(&mut self, edge: &Edge) -> OutputResult<()> {
        self.store_pending().map_err(to_output)?;
        self.pending_first = Some(edge.clone());
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.store_pending().map_err(to_output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("abc123").unwrap();

        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run.config_hash, "abc123");
        assert_eq!(run.status, RunStatus::Running);
        assert!(run.finished_at.is_none());
    }

    #[test]
    fn test_missing_run() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(
            storage.get_run(42),
            Err(StorageError::RunNotFound(42))
        ));
        assert!(storage.get_latest_run().unwrap().is_none());
    }

    #[test]
    fn test_finish_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let first = storage.create_run("a").unwrap();
        let second = storage.create_run("b").unwrap();
        storage.finish_run(second, RunStatus::Interrupted).unwrap();

        let latest = storage.get_latest_run().unwrap().unwrap();
        assert_eq!(latest.id, second);
        assert_eq!(latest.status, RunStatus::Interrupted);
        assert!(latest.finished_at.is_some());
        assert_ne!(first, second);
    }

    #[test]
    fn test_duplicate_node_rejected_within_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash").unwrap();
        let node = Node::new("https://example.org/w/A", "A");

        storage.insert_node(run_id, &node).unwrap();
        assert!(storage.insert_node(run_id, &node).is_err());
    }

    #[test]
    fn test_graph_statistics() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash").unwrap();

        storage.insert_node(run_id, &Node::new("a", "A")).unwrap();
        storage.insert_node(run_id, &Node::new("b", "B")).unwrap();
        storage
            .insert_edge(run_id, &Edge::new("a", "b"), true)
            .unwrap();
        storage
            .insert_edge(run_id, &Edge::new("a", "c"), false)
            .unwrap();
        storage
            .insert_edge(run_id, &Edge::new("b", "c"), false)
            .unwrap();

        assert_eq!(storage.count_nodes(run_id).unwrap(), 2);
        assert_eq!(storage.count_edges(run_id).unwrap(), 3);
        assert_eq!(storage.count_first_edges(run_id).unwrap(), 1);
        assert_eq!(storage.count_dead_ends(run_id).unwrap(), 1);
        assert_eq!(
            storage.top_targets(run_id, 1).unwrap(),
            vec![("c".to_string(), 2)]
        );
    }

    #[test]
    fn test_sink_stores_first_edge_once() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash").unwrap();
        let mut sink = SqliteGraphSink::new(storage, run_id);

        let first = Edge::new("a", "b");
        sink.record_node(&Node::new("a", "A")).unwrap();
        sink.record_first_edge(&first).unwrap();
        sink.record_edge(&first).unwrap();
        sink.record_edge(&Edge::new("a", "c")).unwrap();
        sink.flush().unwrap();

        assert_eq!(sink.storage.count_edges(run_id).unwrap(), 2);
        assert_eq!(sink.storage.count_first_edges(run_id).unwrap(), 1);
    }
}
