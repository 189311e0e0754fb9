//! Server response records and the typed payload entries they carry.
//!
//! A response always has `"status": "success" | "error"`, usually a
//! human-readable `"message"`, and a per-operation set of extra fields kept
//! in a flattened map so every handler shares one record shape on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome discriminator carried by every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// The request was performed.
    Success,
    /// The request was rejected or failed; `message` says why.
    Error,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One response record as sent over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Outcome of the request.
    pub status: Status,
    /// Human-readable outcome description; mandatory on errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Operation-specific payload fields, flattened into the record.
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

impl Response {
    /// A bare success response.
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: Status::Success,
            message: None,
            fields: serde_json::Map::new(),
        }
    }

    /// An error response with a human-readable message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
            fields: serde_json::Map::new(),
        }
    }

    /// Sets the `message` field.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds one payload field from a plain JSON value.
    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Adds one payload field by serializing an arbitrary record.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json::Error` if the record cannot be
    /// serialized; callers treat that as an internal fault.
    pub fn with_serialized<T: Serialize>(
        mut self,
        key: &str,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        self.fields
            .insert(key.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// True when `status` is `success`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Looks up a payload field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Looks up an integer payload field.
    #[must_use]
    pub fn field_i64(&self, key: &str) -> Option<i64> {
        self.field(key).and_then(Value::as_i64)
    }

    /// Looks up a boolean payload field.
    #[must_use]
    pub fn field_bool(&self, key: &str) -> Option<bool> {
        self.field(key).and_then(Value::as_bool)
    }

    /// Looks up a string payload field.
    #[must_use]
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }
}

/// One user as returned by `get_users` and `get_chat_participants`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    /// User id.
    pub id: i64,
    /// Unique username.
    pub username: String,
    /// Display name, falling back to the username when unset.
    pub name: String,
    /// Presence flag as last computed from `last_seen`.
    pub online: bool,
}

/// One chat as returned by `get_chats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    /// Chat id.
    pub id: i64,
    /// Display name; for private chats, the other participant's username.
    pub name: String,
    /// Whether this is a group chat.
    pub is_group: bool,
    /// Usernames of all current participants.
    pub participants: Vec<String>,
}

/// One message as returned by `get_messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    /// Message id.
    pub id: i64,
    /// Author's user id.
    pub user_id: i64,
    /// Author's current username.
    pub username: String,
    /// Message body.
    pub text: String,
    /// Server-assigned write timestamp.
    pub timestamp: DateTime<Utc>,
    /// True for synthesized audit notices, rendered differently by clients.
    pub is_system: bool,
}
