//! Data access layer over SQLite.
//!
//! The [`Store`] owns a mutex-guarded [`rusqlite::Connection`] and guarantees
//! the schema is applied before any other operation. Every request runs as
//! one unit of work through [`Store::with_tx`]: the mutex is held for the
//! duration of a single transaction, which both keeps multi-step operations
//! atomic and serializes check-then-insert sequences (private-chat
//! deduplication in particular) across connections.

pub mod chats;
pub mod messages;
pub mod models;
pub mod schema;
pub mod users;

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{Connection, Transaction};

/// Errors produced by the store layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// SQLite error.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to create the database directory.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// A fetched record could not be serialized into a response.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Convenience alias used throughout the store.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Handle to the relational store shared by all connections.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Opens (or creates) the database at an explicit path.
    ///
    /// Parent directories are created as needed. WAL journaling and foreign
    /// key enforcement are enabled, and the schema is applied.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the directory or database cannot be created
    /// or the schema fails to apply.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        tracing::info!(path = %path.display(), "opening database");
        Self::init(Connection::open(path)?)
    }

    /// Opens a fresh in-memory database, for tests and ephemeral servers.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the schema fails to apply.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs one unit of work: a closure over a transaction that commits on
    /// `Ok` and rolls back on `Err`.
    ///
    /// Transactions are never held across requests; each handler call opens
    /// its own.
    ///
    /// # Errors
    ///
    /// Propagates any [`StoreError`] from the closure or the commit; the
    /// transaction is rolled back on the way out.
    pub fn with_tx<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}
