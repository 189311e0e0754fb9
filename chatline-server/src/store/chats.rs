//! CRUD operations for [`Chat`] and participant records.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};

use crate::store::Result;
use crate::store::models::{Chat, User};

/// Inserts a new chat, returning its id.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] on insert failure.
pub fn insert(
    conn: &Connection,
    name: &str,
    is_group: bool,
    created_at: DateTime<Utc>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO chats (name, is_group, created_at) VALUES (?1, ?2, ?3)",
        params![name, is_group, created_at],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Fetches a chat by id.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] on query failure.
pub fn find(conn: &Connection, id: i64) -> Result<Option<Chat>> {
    let mut stmt =
        conn.prepare("SELECT id, name, is_group, created_at FROM chats WHERE id = ?1")?;
    let mut rows = stmt.query_map(params![id], from_row)?;
    rows.next().transpose().map_err(Into::into)
}

/// Renames a chat.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] on update failure.
pub fn set_name(conn: &Connection, id: i64, name: &str) -> Result<()> {
    conn.execute("UPDATE chats SET name = ?2 WHERE id = ?1", params![id, name])?;
    Ok(())
}

/// Lists every chat the user currently participates in, ordered by id.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] on query failure.
pub fn chats_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Chat>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, c.is_group, c.created_at
         FROM chats c
         JOIN chat_participants p ON p.chat_id = c.id
         WHERE p.user_id = ?1
         ORDER BY c.id",
    )?;
    let rows = stmt.query_map(params![user_id], from_row)?;
    let mut chats = Vec::new();
    for row in rows {
        chats.push(row?);
    }
    Ok(chats)
}

/// Finds the non-group chat whose participant set is exactly the given pair,
/// if one exists.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] on query failure.
pub fn find_private_chat(conn: &Connection, a: i64, b: i64) -> Result<Option<i64>> {
    let mut stmt = conn.prepare(
        "SELECT c.id
         FROM chats c
         JOIN chat_participants p ON p.chat_id = c.id
         WHERE c.is_group = 0
         GROUP BY c.id
         HAVING COUNT(*) = 2 AND SUM(p.user_id IN (?1, ?2)) = 2",
    )?;
    let mut rows = stmt.query_map(params![a, b], |row| row.get::<_, i64>(0))?;
    rows.next().transpose().map_err(Into::into)
}

/// Adds a member to a chat, returning the participant row id.
///
/// # Errors
///
/// Returns a constraint error if the pair already exists; callers check
/// membership first inside the same transaction.
pub fn add_participant(conn: &Connection, chat_id: i64, user_id: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO chat_participants (user_id, chat_id) VALUES (?1, ?2)",
        params![user_id, chat_id],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Removes a member from a chat. Returns `true` if a row was deleted.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] on delete failure.
pub fn remove_participant(conn: &Connection, chat_id: i64, user_id: i64) -> Result<bool> {
    let affected = conn.execute(
        "DELETE FROM chat_participants WHERE chat_id = ?1 AND user_id = ?2",
        params![chat_id, user_id],
    )?;
    Ok(affected > 0)
}

/// True when the user is currently a member of the chat.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] on query failure.
pub fn is_participant(conn: &Connection, chat_id: i64, user_id: i64) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM chat_participants WHERE chat_id = ?1 AND user_id = ?2",
        params![chat_id, user_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Lists a chat's current members as full user records, ordered by id.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] on query failure.
pub fn participants(conn: &Connection, chat_id: i64) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.username, u.password_hash, u.name, u.online, u.last_seen
         FROM users u
         JOIN chat_participants p ON p.user_id = u.id
         WHERE p.chat_id = ?1
         ORDER BY u.id",
    )?;
    let rows = stmt.query_map(params![chat_id], |row| {
        Ok(User {
            id: row.get("id")?,
            username: row.get("username")?,
            password_hash: row.get("password_hash")?,
            name: row.get("name")?,
            online: row.get("online")?,
            last_seen: row.get("last_seen")?,
        })
    })?;
    let mut members = Vec::new();
    for row in rows {
        members.push(row?);
    }
    Ok(members)
}

/// Lists a chat's current member usernames, ordered by user id.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] on query failure.
pub fn participant_usernames(conn: &Connection, chat_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT u.username
         FROM users u
         JOIN chat_participants p ON p.user_id = u.id
         WHERE p.chat_id = ?1
         ORDER BY u.id",
    )?;
    let rows = stmt.query_map(params![chat_id], |row| row.get::<_, String>(0))?;
    let mut names = Vec::new();
    for row in rows {
        names.push(row?);
    }
    Ok(names)
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Chat> {
    Ok(Chat {
        id: row.get("id")?,
        name: row.get("name")?,
        is_group: row.get("is_group")?,
        created_at: row.get("created_at")?,
    })
}
