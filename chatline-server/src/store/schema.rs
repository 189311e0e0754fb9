//! Embedded schema, applied on every open.
//!
//! Four tables mirror the persisted layout: `users`, `chats`,
//! `chat_participants`, `messages`. Timestamps are RFC 3339 text, booleans
//! are integers. The `chat_participants(user_id, chat_id)` uniqueness
//! backstops duplicate membership rows at the storage level.

use rusqlite::Connection;

use crate::store::Result;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    name          TEXT,
    online        INTEGER NOT NULL DEFAULT 0,
    last_seen     TEXT
);

CREATE TABLE IF NOT EXISTS chats (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT,
    is_group   INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chat_participants (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    chat_id INTEGER NOT NULL REFERENCES chats(id),

    UNIQUE (user_id, chat_id)
);

CREATE INDEX IF NOT EXISTS idx_participants_chat ON chat_participants(chat_id);

CREATE TABLE IF NOT EXISTS messages (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id   INTEGER NOT NULL REFERENCES users(id),
    chat_id   INTEGER NOT NULL REFERENCES chats(id),
    text      TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    is_system INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_messages_chat_ts ON messages(chat_id, timestamp);
";

/// Applies the schema. Idempotent.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] if any statement fails.
pub fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
