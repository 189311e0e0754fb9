//! Typed client requests and their wire-level parsing.
//!
//! Every request record carries a mandatory `"type"` discriminator string.
//! Parsing is two-staged so the dispatcher can tell an unknown discriminator
//! apart from a known request with malformed fields — both are answered with
//! an error response, but with different messages, and neither closes the
//! connection.

use serde::{Deserialize, Serialize};

/// A decoded client request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Create a new user account.
    Register {
        /// Desired unique username.
        username: String,
        /// Plaintext password, hashed server-side before storage.
        password: String,
    },
    /// Authenticate and mark the user online.
    Login {
        /// Username to authenticate as.
        username: String,
        /// Plaintext password.
        password: String,
    },
    /// List all chats the user participates in.
    GetChats {
        /// Requesting user's id.
        user_id: i64,
        /// Requesting user's username, used to name private chats after the
        /// other participant.
        username: String,
    },
    /// Fetch a chat's full message timeline.
    GetMessages {
        /// Chat to read.
        chat_id: i64,
    },
    /// Append a message to a chat.
    SendMessage {
        /// Author's user id.
        user_id: i64,
        /// Target chat id.
        chat_id: i64,
        /// Message body.
        text: String,
    },
    /// Create a chat, deduplicating private two-party pairs.
    CreateChat {
        /// Creating user's id; must appear in `participant_ids`.
        user_id: i64,
        /// Ids of every intended participant, creator included.
        participant_ids: Vec<i64>,
        /// Group flag; defaults to `participant_ids.len() > 2` when absent.
        #[serde(default)]
        is_group: Option<bool>,
        /// Explicit display name; required for groups of more than two.
        #[serde(default)]
        name: Option<String>,
    },
    /// Change display name, username, and/or password in one call.
    UpdateProfile {
        /// User being modified.
        user_id: i64,
        /// New display name, applied unconditionally.
        #[serde(default)]
        new_name: Option<String>,
        /// New username; needs `password` for re-verification.
        #[serde(default)]
        new_username: Option<String>,
        /// Current password, verified before a username change.
        #[serde(default)]
        password: Option<String>,
        /// New password; needs `old_password` for verification.
        #[serde(default)]
        new_password: Option<String>,
        /// Current password, verified before a password change.
        #[serde(default)]
        old_password: Option<String>,
    },
    /// List all registered users.
    GetUsers {
        /// When true, recompute presence from `last_seen` before answering.
        #[serde(default)]
        force_update: bool,
    },
    /// Rename a chat, recording the change as a system message.
    UpdateChatName {
        /// Chat to rename.
        chat_id: i64,
        /// New display name.
        new_name: String,
        /// Acting user; must be a participant.
        user_id: i64,
    },
    /// List a chat's current participants with fresh presence.
    GetChatParticipants {
        /// Chat to inspect.
        chat_id: i64,
    },
    /// Remove a member from a chat.
    RemoveParticipant {
        /// Chat to mutate.
        chat_id: i64,
        /// Acting user; must be a participant.
        user_id: i64,
        /// User being removed.
        participant_id: i64,
    },
    /// Add a member to a chat.
    AddParticipant {
        /// Chat to mutate.
        chat_id: i64,
        /// Acting user; must be a participant.
        user_id: i64,
        /// User being added.
        participant_id: i64,
    },
}

/// The `"type"` discriminators this dispatcher recognizes.
const KNOWN_TYPES: &[&str] = &[
    "register",
    "login",
    "get_chats",
    "get_messages",
    "send_message",
    "create_chat",
    "update_profile",
    "get_users",
    "update_chat_name",
    "get_chat_participants",
    "remove_participant",
    "add_participant",
];

/// A request-local parse failure. None of these close the connection; each
/// maps to an error-shaped response over the same framing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// Payload was not a JSON object.
    #[error("Invalid JSON")]
    InvalidJson,
    /// The `"type"` discriminator was missing or unrecognized.
    #[error("Unknown message type")]
    UnknownType,
    /// A known request type with missing or mistyped fields.
    #[error("Invalid request: {0}")]
    BadFields(String),
}

impl Request {
    /// Parses raw payload bytes into a typed request.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidJson`] if the bytes are not a JSON
    /// object, [`RequestError::UnknownType`] if the `"type"` discriminator is
    /// absent or unrecognized, or [`RequestError::BadFields`] if a recognized
    /// request is missing required fields.
    pub fn parse(bytes: &[u8]) -> Result<Self, RequestError> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|_| RequestError::InvalidJson)?;
        let Some(map) = value.as_object() else {
            return Err(RequestError::InvalidJson);
        };
        let Some(ty) = map.get("type").and_then(serde_json::Value::as_str) else {
            return Err(RequestError::UnknownType);
        };
        if !KNOWN_TYPES.contains(&ty) {
            return Err(RequestError::UnknownType);
        }
        serde_json::from_value(value).map_err(|e| RequestError::BadFields(e.to_string()))
    }

    /// Returns the request's wire discriminator, for logging.
    #[must_use]
    pub const fn request_type(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::Login { .. } => "login",
            Self::GetChats { .. } => "get_chats",
            Self::GetMessages { .. } => "get_messages",
            Self::SendMessage { .. } => "send_message",
            Self::CreateChat { .. } => "create_chat",
            Self::UpdateProfile { .. } => "update_profile",
            Self::GetUsers { .. } => "get_users",
            Self::UpdateChatName { .. } => "update_chat_name",
            Self::GetChatParticipants { .. } => "get_chat_participants",
            Self::RemoveParticipant { .. } => "remove_participant",
            Self::AddParticipant { .. } => "add_participant",
        }
    }
}
