//! Domain model structs persisted in the relational store.

use chrono::{DateTime, Utc};

/// A registered user identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Immutable numeric id.
    pub id: i64,
    /// Unique username.
    pub username: String,
    /// Salted one-way password digest, `salt$digest`. Never the plaintext.
    pub password_hash: String,
    /// Optional display name.
    pub name: Option<String>,
    /// Presence flag as last persisted.
    pub online: bool,
    /// Last liveness evidence; `None` means never seen.
    pub last_seen: Option<DateTime<Utc>>,
}

impl User {
    /// Display name, falling back to the username when unset.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.username)
    }
}

/// A conversation. A two-participant, non-group chat is a private chat;
/// at most one exists per unordered participant pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    /// Numeric id.
    pub id: i64,
    /// Display name; always synthesized at creation but nullable in storage.
    pub name: Option<String>,
    /// Group flag.
    pub is_group: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One entry in a chat's append-only timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Numeric id; ties in timestamp order are broken by id.
    pub id: i64,
    /// Author's user id (the acting user for system messages).
    pub user_id: i64,
    /// Owning chat.
    pub chat_id: i64,
    /// Body text.
    pub text: String,
    /// Server-assigned write timestamp.
    pub timestamp: DateTime<Utc>,
    /// True for synthesized audit notices.
    pub is_system: bool,
}
