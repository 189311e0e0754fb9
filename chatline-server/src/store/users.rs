//! CRUD operations for [`User`] records.
//!
//! All functions borrow a connection so they compose inside one unit of
//! work; a [`rusqlite::Transaction`] derefs to [`Connection`].

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};

use crate::store::Result;
use crate::store::models::User;

const COLUMNS: &str = "id, username, password_hash, name, online, last_seen";

/// Inserts a new user, returning its id.
///
/// # Errors
///
/// Returns a constraint error if the username is taken; callers check
/// uniqueness first inside the same transaction.
pub fn insert(
    conn: &Connection,
    username: &str,
    password_hash: &str,
    last_seen: DateTime<Utc>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (username, password_hash, last_seen) VALUES (?1, ?2, ?3)",
        params![username, password_hash, last_seen],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Fetches a user by username.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] on query failure.
pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM users WHERE username = ?1"))?;
    let mut rows = stmt.query_map(params![username], from_row)?;
    rows.next().transpose().map_err(Into::into)
}

/// Fetches a user by id.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] on query failure.
pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<User>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM users WHERE id = ?1"))?;
    let mut rows = stmt.query_map(params![id], from_row)?;
    rows.next().transpose().map_err(Into::into)
}

/// Lists all users ordered by id.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] on query failure.
pub fn list_all(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM users ORDER BY id"))?;
    let rows = stmt.query_map([], from_row)?;
    collect(rows)
}

/// Fetches the distinct users matching the given ids.
///
/// Duplicate input ids yield one row each, so callers can detect both
/// unknown and repeated ids by comparing lengths.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] on query failure.
pub fn by_ids(conn: &Connection, ids: &[i64]) -> Result<Vec<User>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM users WHERE id IN ({placeholders}) ORDER BY id"
    ))?;
    let rows = stmt.query_map(rusqlite::params_from_iter(ids.iter()), from_row)?;
    collect(rows)
}

/// Sets both the presence flag and the last-seen timestamp.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] on update failure.
pub fn set_presence(
    conn: &Connection,
    id: i64,
    online: bool,
    last_seen: Option<DateTime<Utc>>,
) -> Result<()> {
    conn.execute(
        "UPDATE users SET online = ?2, last_seen = ?3 WHERE id = ?1",
        params![id, online, last_seen],
    )?;
    Ok(())
}

/// Updates only the presence flag, leaving liveness evidence untouched.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] on update failure.
pub fn set_online_flag(conn: &Connection, id: i64, online: bool) -> Result<()> {
    conn.execute(
        "UPDATE users SET online = ?2 WHERE id = ?1",
        params![id, online],
    )?;
    Ok(())
}

/// Updates the display name.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] on update failure.
pub fn update_name(conn: &Connection, id: i64, name: &str) -> Result<()> {
    conn.execute("UPDATE users SET name = ?2 WHERE id = ?1", params![id, name])?;
    Ok(())
}

/// Updates the username.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] on update failure.
pub fn update_username(conn: &Connection, id: i64, username: &str) -> Result<()> {
    conn.execute(
        "UPDATE users SET username = ?2 WHERE id = ?1",
        params![id, username],
    )?;
    Ok(())
}

/// Replaces the stored password digest.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] on update failure.
pub fn update_password_hash(conn: &Connection, id: i64, password_hash: &str) -> Result<()> {
    conn.execute(
        "UPDATE users SET password_hash = ?2 WHERE id = ?1",
        params![id, password_hash],
    )?;
    Ok(())
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        name: row.get("name")?,
        online: row.get("online")?,
        last_seen: row.get("last_seen")?,
    })
}

fn collect(rows: impl Iterator<Item = rusqlite::Result<User>>) -> Result<Vec<User>> {
    let mut users = Vec::new();
    for row in rows {
        users.push(row?);
    }
    Ok(users)
}
