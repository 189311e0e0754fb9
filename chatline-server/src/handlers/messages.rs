//! Message append and timeline handlers.

use chatline_proto::response::{MessageEntry, Response};
use chrono::Utc;

use crate::store::{Store, StoreError, chats, messages, users};

/// Appends a user message with a server-assigned timestamp. Membership in
/// the chat is deliberately not required; any known user may post to any
/// known chat.
pub fn send_message(
    store: &Store,
    user_id: i64,
    chat_id: i64,
    text: &str,
) -> Result<Response, StoreError> {
    store.with_tx(|tx| {
        if users::find_by_id(tx, user_id)?.is_none() {
            return Ok(Response::error("User not found"));
        }
        if chats::find(tx, chat_id)?.is_none() {
            return Ok(Response::error("Chat not found"));
        }
        messages::insert(tx, user_id, chat_id, text, Utc::now(), false)?;
        Ok(Response::success().with_message("Message sent"))
    })
}

/// Returns a chat's full timeline in timestamp order, each message carrying
/// its author's current username and the system flag.
pub fn get_messages(store: &Store, chat_id: i64) -> Result<Response, StoreError> {
    store.with_tx(|tx| {
        let entries: Vec<MessageEntry> = messages::for_chat(tx, chat_id)?
            .into_iter()
            .map(|(message, username)| MessageEntry {
                id: message.id,
                user_id: message.user_id,
                username,
                text: message.text,
                timestamp: message.timestamp,
                is_system: message.is_system,
            })
            .collect();
        Ok(Response::success().with_serialized("messages", &entries)?)
    })
}
