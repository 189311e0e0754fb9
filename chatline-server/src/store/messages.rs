//! CRUD operations for [`Message`] records.
//!
//! Messages are append-only; there is no update or delete.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

use crate::store::Result;
use crate::store::models::Message;

/// Inserts one message, returning its id.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] on insert failure (including a
/// foreign key violation for an unknown author or chat).
pub fn insert(
    conn: &Connection,
    user_id: i64,
    chat_id: i64,
    text: &str,
    timestamp: DateTime<Utc>,
    is_system: bool,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO messages (user_id, chat_id, text, timestamp, is_system)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user_id, chat_id, text, timestamp, is_system],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Fetches a chat's timeline in timestamp order (id as tiebreaker), each
/// message paired with its author's current username.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] on query failure.
pub fn for_chat(conn: &Connection, chat_id: i64) -> Result<Vec<(Message, String)>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.user_id, m.chat_id, m.text, m.timestamp, m.is_system, u.username
         FROM messages m
         JOIN users u ON u.id = m.user_id
         WHERE m.chat_id = ?1
         ORDER BY m.timestamp, m.id",
    )?;
    let rows = stmt.query_map(params![chat_id], |row| {
        Ok((
            Message {
                id: row.get("id")?,
                user_id: row.get("user_id")?,
                chat_id: row.get("chat_id")?,
                text: row.get("text")?,
                timestamp: row.get("timestamp")?,
                is_system: row.get("is_system")?,
            },
            row.get::<_, String>("username")?,
        ))
    })?;
    let mut timeline = Vec::new();
    for row in rows {
        timeline.push(row?);
    }
    Ok(timeline)
}
