use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Key under which the serialized quote collection lives.
pub const KEY_QUOTES: &str = "quotevault.quotes.v1";
/// Key under which the last-selected category filter lives.
pub const KEY_FILTER: &str = "quotevault.filter.v1";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("could not open store at {0}")]
    Open(String),

    #[error("storage operation failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("write failed: {0}")]
    WriteFailed(String),
}

/// String-valued key-value persistence.
///
/// A save either fully replaces the prior value or fails with the prior
/// value intact; callers never observe a half-written entry.
pub trait StringStore: Send {
    fn load(&self, key: &str) -> crate::Result<Option<String>>;
    fn save(&mut self, key: &str, value: &str) -> crate::Result<()>;
}

/// SQLite-backed store
///
/// SQLite was chosen because:
/// - Zero-config embedded database
/// - A single-statement upsert is atomic, so a failed write never corrupts
/// - Battle-tested and reliable
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Open(format!("{}: {}", path.display(), e)))?;
        }
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Open(format!("{}: {}", path.display(), e)))?;
        Self::init_schema(&conn)?;
        debug!("Opened store at {}", path.display());
        Ok(Self { conn })
    }

    /// In-memory store, handy for tests and ephemeral runs.
    pub fn open_in_memory() -> crate::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> crate::Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

impl StringStore for SqliteStore {
    fn load(&self, key: &str) -> crate::Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn save(&mut self, key: &str, value: &str) -> crate::Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }
}

/// HashMap-backed store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StringStore for MemoryStore {
    fn load(&self, key: &str) -> crate::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> crate::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
