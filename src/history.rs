use chrono::{DateTime, Local, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::stats::{self, Statistics};

/// A completed attempt. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solve {
    pub id: Uuid,
    #[serde(rename = "time")]
    pub time_ms: u64,
    pub scramble: String,
    pub timestamp: DateTime<Local>,
}

impl Solve {
    pub fn new(time_ms: u64, scramble: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            time_ms,
            scramble,
            timestamp: Local::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("solve {0} not found")]
    NotFound(Uuid),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence boundary for solve history. `list` returns newest first.
pub trait SolveStore {
    fn list(&self) -> Result<Vec<Solve>, StoreError>;
    fn append(&mut self, solve: &Solve) -> Result<(), StoreError>;
    fn remove(&mut self, id: &Uuid) -> Result<(), StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// SQLite-backed solve history
#[derive(Debug)]
pub struct SqliteSolveStore {
    conn: Connection,
}

impl SqliteSolveStore {
    /// Open (or create) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS solves (
                id TEXT PRIMARY KEY,
                time INTEGER NOT NULL,
                scramble TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_solves_timestamp ON solves(timestamp DESC)",
            [],
        )?;

        Ok(Self { conn })
    }
}

impl SolveStore for SqliteSolveStore {
    fn list(&self) -> Result<Vec<Solve>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, time, scramble, timestamp
            FROM solves
            ORDER BY timestamp DESC, rowid DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let id_str: String = row.get(0)?;
            let id = Uuid::parse_str(&id_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
            })?;

            let timestamp_str: String = row.get(3)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?
                .with_timezone(&Local);

            Ok(Solve {
                id,
                time_ms: row.get(1)?,
                scramble: row.get(2)?,
                timestamp,
            })
        })?;

        let mut solves = Vec::new();
        for solve in rows {
            solves.push(solve?);
        }
        Ok(solves)
    }

    fn append(&mut self, solve: &Solve) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO solves (id, time, scramble, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![
                solve.id.to_string(),
                solve.time_ms,
                solve.scramble,
                sortable_timestamp(&solve.timestamp),
            ],
        )?;
        Ok(())
    }

    fn remove(&mut self, id: &Uuid) -> Result<(), StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM solves WHERE id = ?1", [id.to_string()])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(*id));
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM solves", [])?;
        Ok(())
    }
}

/// UTC with a fixed number of fraction digits, so text order is time order
/// even across a local offset change
fn sortable_timestamp(timestamp: &DateTime<Local>) -> String {
    timestamp
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Whole history kept as one JSON array on disk
#[derive(Debug, Clone)]
pub struct JsonSolveStore {
    path: PathBuf,
}

impl JsonSolveStore {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    fn write_all(&self, solves: &[Solve]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(solves)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

impl SolveStore for JsonSolveStore {
    /// A missing or unreadable file is an empty history
    fn list(&self) -> Result<Vec<Solve>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable history file");
                Vec::new()
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn append(&mut self, solve: &Solve) -> Result<(), StoreError> {
        let mut solves = self.list()?;
        solves.insert(0, solve.clone());
        self.write_all(&solves)
    }

    fn remove(&mut self, id: &Uuid) -> Result<(), StoreError> {
        let mut solves = self.list()?;
        let before = solves.len();
        solves.retain(|s| s.id != *id);
        if solves.len() == before {
            return Err(StoreError::NotFound(*id));
        }
        self.write_all(&solves)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.write_all(&[])
    }
}

/// Volatile store; clones share contents, which lets tests inject failures
#[derive(Debug, Clone, Default)]
pub struct MemorySolveStore {
    solves: Arc<Mutex<Vec<Solve>>>,
    failing: Arc<AtomicBool>,
}

impl MemorySolveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, Vec<Solve>>, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store set to fail".into()));
        }
        self.solves
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".into()))
    }
}

impl SolveStore for MemorySolveStore {
    fn list(&self) -> Result<Vec<Solve>, StoreError> {
        Ok(self.guard()?.clone())
    }

    fn append(&mut self, solve: &Solve) -> Result<(), StoreError> {
        self.guard()?.insert(0, solve.clone());
        Ok(())
    }

    fn remove(&mut self, id: &Uuid) -> Result<(), StoreError> {
        let mut solves = self.guard()?;
        let before = solves.len();
        solves.retain(|s| s.id != *id);
        if solves.len() == before {
            return Err(StoreError::NotFound(*id));
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.guard()?.clear();
        Ok(())
    }
}

/// In-memory, newest-first view of the store.
///
/// Mutations apply to the view first and are rolled back if the store
/// rejects them. Statistics are recomputed after every change.
pub struct History {
    store: Box<dyn SolveStore>,
    solves: Vec<Solve>,
    stats: Statistics,
}

impl History {
    pub fn load(store: Box<dyn SolveStore>) -> Result<Self, StoreError> {
        let solves = store.list()?;
        debug!(count = solves.len(), "loaded solve history");
        let stats = stats::compute(&solves);
        Ok(Self {
            store,
            solves,
            stats,
        })
    }

    pub fn solves(&self) -> &[Solve] {
        &self.solves
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn latest(&self) -> Option<&Solve> {
        self.solves.first()
    }

    pub fn record(&mut self, solve: Solve) -> Result<(), StoreError> {
        let id = solve.id;
        self.solves.insert(0, solve);
        self.refresh();

        if let Err(e) = self.store.append(&self.solves[0]) {
            warn!(%id, error = %e, "append rejected, rolling back");
            self.solves.retain(|s| s.id != id);
            self.refresh();
            return Err(e);
        }
        info!(%id, time_ms = self.solves[0].time_ms, "solve recorded");
        Ok(())
    }

    pub fn remove(&mut self, id: &Uuid) -> Result<(), StoreError> {
        let Some(idx) = self.solves.iter().position(|s| s.id == *id) else {
            return Err(StoreError::NotFound(*id));
        };
        let removed = self.solves.remove(idx);
        self.refresh();

        if let Err(e) = self.store.remove(id) {
            warn!(%id, error = %e, "remove rejected, rolling back");
            self.solves.insert(idx, removed);
            self.refresh();
            return Err(e);
        }
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        let previous = std::mem::take(&mut self.solves);
        self.refresh();

        if let Err(e) = self.store.clear() {
            warn!(error = %e, "clear rejected, rolling back");
            self.solves = previous;
            self.refresh();
            return Err(e);
        }
        Ok(())
    }

    fn refresh(&mut self) {
        self.stats = stats::compute(&self.solves);
    }
}
