//! SQLite access shared by the plan store and the catalog.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;
use thiserror::Error;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Errors raised by any storage tier.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("blocking task failed: {0}")]
    Join(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Handle to the SQLite database file. Connections are opened per call.
#[derive(Debug, Clone)]
pub struct Db {
    path: PathBuf,
}

impl Db {
    /// Point at a database file without touching it.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create the parent directory and apply the schema.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let db = Self::new(path);
        if let Some(parent) = db.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = db.connection()?;
        conn.execute_batch(SCHEMA_SQL)?;
        tracing::info!(db_path = %db.path.display(), "database ready");
        Ok(db)
    }

    pub fn connection(&self) -> StoreResult<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_schema() {
        let dir = tempfile::tempdir().unwrap();
        let db = Db::open(dir.path().join("nested/demo.db")).unwrap();
        let conn = db.connection().unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        for table in ["demo_values", "projects", "timesheets", "users"] {
            assert!(tables.iter().any(|t| t == table), "missing {table}");
        }
    }

    #[test]
    fn test_open_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.db");
        Db::open(&path).unwrap();
        Db::open(&path).unwrap();
    }
}
