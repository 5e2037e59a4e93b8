//! Budget plan persistence.
//!
//! Plans live in a shared key/value namespace under `budget_plan_{project_id}`.
//! The primary tier is the `demo_values` SQLite table; when it fails, the
//! same call is replayed against a single JSON document on disk.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{named_params, OptionalExtension};
use serde_json::{Map, Value};

use super::plan::{BudgetPlan, PlanStatus};
use crate::db::{Db, StoreResult};

const KEY_PREFIX: &str = "budget_plan_";

/// File name of the fallback document inside the data directory.
pub const FALLBACK_FILE_NAME: &str = "budget-plans.json";

/// Two-method key/value capability implemented by every storage tier.
pub trait KvStore: Send + Sync {
    /// Fetch the structured value stored under `key`.
    ///
    /// Missing keys and values that are not JSON objects or arrays are `None`.
    fn load(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Insert or replace the value under `key`.
    fn save(&self, key: &str, value: &Value) -> StoreResult<()>;
}

/// Keep only structured JSON (objects and arrays).
fn structured(value: Value) -> Option<Value> {
    match value {
        Value::Object(_) | Value::Array(_) => Some(value),
        _ => None,
    }
}

/// Primary tier: the `demo_values(id, name, value)` table.
#[derive(Debug, Clone)]
pub struct SqliteKvStore {
    db: Db,
}

impl SqliteKvStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

impl KvStore for SqliteKvStore {
    fn load(&self, key: &str) -> StoreResult<Option<Value>> {
        let conn = self.db.connection()?;
        let raw: Option<Option<String>> = conn
            .query_row(
                "SELECT value FROM demo_values WHERE name = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        let Some(raw) = raw.flatten().filter(|raw| !raw.is_empty()) else {
            return Ok(None);
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Ok(structured(value)),
            Err(e) => {
                tracing::debug!(key, error = %e, "ignoring malformed stored value");
                Ok(None)
            }
        }
    }

    fn save(&self, key: &str, value: &Value) -> StoreResult<()> {
        let payload = serde_json::to_string(value)?;
        let conn = self.db.connection()?;
        conn.execute(
            r#"
                INSERT INTO demo_values (name, value)
                VALUES (:name, :value)
                ON CONFLICT(name) DO UPDATE SET value = excluded.value
            "#,
            named_params! {":name": key, ":value": payload},
        )?;
        Ok(())
    }
}

/// Fallback tier: the whole namespace as one JSON object in a flat file.
#[derive(Debug)]
pub struct JsonFileKvStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileKvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Fallback document inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(FALLBACK_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Read the namespace document. Missing, empty or malformed files are `None`.
    fn read_document(&self) -> StoreResult<Option<Map<String, Value>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read(&self.path)?;
        if raw.is_empty() {
            return Ok(None);
        }
        match serde_json::from_slice::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            _ => Ok(None),
        }
    }
}

impl KvStore for JsonFileKvStore {
    fn load(&self, key: &str) -> StoreResult<Option<Value>> {
        let Some(mut document) = self.read_document()? else {
            return Ok(None);
        };
        Ok(document.remove(key).and_then(structured))
    }

    fn save(&self, key: &str, value: &Value) -> StoreResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut document = self.read_document()?.unwrap_or_default();
        document.insert(key.to_string(), value.clone());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        // Readers never see a partially written document.
        let staging = self.staging_path();
        std::fs::write(&staging, serde_json::to_vec(&Value::Object(document))?)?;
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

/// Decorator that replays a failed call against a secondary tier.
///
/// Errors from the secondary are returned to the caller as-is.
#[derive(Debug)]
pub struct FallbackKvStore<P, S> {
    primary: P,
    secondary: S,
}

impl<P: KvStore, S: KvStore> FallbackKvStore<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

impl<P: KvStore, S: KvStore> KvStore for FallbackKvStore<P, S> {
    fn load(&self, key: &str) -> StoreResult<Option<Value>> {
        match self.primary.load(key) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "primary store load failed, using fallback");
                self.secondary.load(key)
            }
        }
    }

    fn save(&self, key: &str, value: &Value) -> StoreResult<()> {
        match self.primary.save(key, value) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(key, error = %e, "primary store save failed, using fallback");
                self.secondary.save(key, value)
            }
        }
    }
}

/// Plan store used by the HTTP layer.
pub type PlanStorage = BudgetPlanStore<FallbackKvStore<SqliteKvStore, JsonFileKvStore>>;

/// Reads and writes budget plans through any [`KvStore`].
#[derive(Debug)]
pub struct BudgetPlanStore<S> {
    kv: S,
}

impl<S: KvStore> BudgetPlanStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    /// Namespaced storage key for a project.
    pub fn key_for(project_id: i64) -> String {
        format!("{}{}", KEY_PREFIX, project_id)
    }

    /// Load a project's plan. `None` when nothing usable is stored.
    pub fn load(&self, project_id: i64) -> StoreResult<Option<BudgetPlan>> {
        let stored = self.kv.load(&Self::key_for(project_id))?;
        Ok(stored.as_ref().map(BudgetPlan::from_stored))
    }

    /// Persist a plan. Plans in the `NEW` state are never written.
    pub fn save(&self, project_id: i64, status: PlanStatus, rows: &[Value]) -> StoreResult<()> {
        if status == PlanStatus::New {
            tracing::debug!(project_id, "skipping save of NEW plan");
            return Ok(());
        }

        let plan = BudgetPlan::new(status, rows.to_vec());
        self.kv.save(&Self::key_for(project_id), &plan.to_document())?;
        tracing::info!(project_id, status = %status, rows = rows.len(), "budget plan saved");
        Ok(())
    }
}

impl PlanStorage {
    /// SQLite primary with the JSON file in `data_dir` as fallback.
    pub fn with_fallback(db: Db, data_dir: &Path) -> Self {
        Self::new(FallbackKvStore::new(
            SqliteKvStore::new(db),
            JsonFileKvStore::in_dir(data_dir),
        ))
    }
}
