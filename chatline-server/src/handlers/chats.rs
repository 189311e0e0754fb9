//! Chat lifecycle and participant management handlers.
//!
//! Every membership mutation commits its system message in the same unit of
//! work as the membership change, so neither is ever visible without the
//! other.

use chatline_proto::response::{ChatEntry, Response};
use chrono::Utc;
use rusqlite::Transaction;

use crate::handlers::user_entry;
use crate::presence;
use crate::store::models::User;
use crate::store::{Store, StoreError, chats, messages, users};

/// Creates a chat, or returns the existing one when an identical private
/// pair already has one.
pub fn create_chat(
    store: &Store,
    user_id: i64,
    participant_ids: &[i64],
    is_group: Option<bool>,
    name: Option<&str>,
) -> Result<Response, StoreError> {
    let is_group = is_group.unwrap_or(participant_ids.len() > 2);
    if is_group && participant_ids.len() > 2 && name.is_none_or(str::is_empty) {
        return Ok(Response::error("Group chat requires a name"));
    }
    if !participant_ids.contains(&user_id) {
        return Ok(Response::error("Invalid participants"));
    }

    store.with_tx(|tx| {
        let members = users::by_ids(tx, participant_ids)?;
        if members.len() != participant_ids.len() {
            return Ok(Response::error("One or more users not found"));
        }

        // The store mutex serializes this check-then-insert, so two
        // concurrent creations of the same pair cannot both pass.
        if !is_group && participant_ids.len() == 2 {
            if let Some(chat_id) = chats::find_private_chat(tx, participant_ids[0], participant_ids[1])? {
                return Ok(Response::success()
                    .with_message("Chat already exists")
                    .with_field("chat_id", chat_id)
                    .with_field("existing", true));
            }
        }

        let chat_name = synthesize_name(&members, is_group, name);
        let chat_id = chats::insert(tx, &chat_name, is_group, Utc::now())?;
        for &participant_id in participant_ids {
            chats::add_participant(tx, chat_id, participant_id)?;
        }
        tracing::info!(chat_id, is_group, "chat created");
        Ok(Response::success()
            .with_message("Chat created successfully")
            .with_field("chat_id", chat_id)
            .with_field("chat_name", chat_name))
    })
}

/// Display-name synthesis: an explicit name wins; a private pair gets the
/// sorted usernames joined by " & "; anything else falls back to a generic
/// label.
fn synthesize_name(members: &[User], is_group: bool, explicit: Option<&str>) -> String {
    if let Some(name) = explicit.filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    if !is_group && members.len() == 2 {
        let mut names: Vec<&str> = members.iter().map(|u| u.username.as_str()).collect();
        names.sort_unstable();
        return names.join(" & ");
    }
    "Group Chat".to_string()
}

/// Lists every chat the user participates in. Non-group chats are presented
/// under the other participant's username rather than the stored name.
pub fn get_user_chats(store: &Store, user_id: i64, username: &str) -> Result<Response, StoreError> {
    store.with_tx(|tx| {
        let mut entries = Vec::new();
        for chat in chats::chats_for_user(tx, user_id)? {
            let participants = chats::participant_usernames(tx, chat.id)?;
            let name = if chat.is_group {
                chat.name.unwrap_or_else(|| "Group Chat".to_string())
            } else {
                participants
                    .iter()
                    .find(|p| p.as_str() != username)
                    .or_else(|| participants.first())
                    .cloned()
                    .unwrap_or_default()
            };
            entries.push(ChatEntry {
                id: chat.id,
                name,
                is_group: chat.is_group,
                participants,
            });
        }
        Ok(Response::success().with_serialized("chats", &entries)?)
    })
}

/// Renames a chat and records the change as a system message, atomically.
pub fn update_chat_name(
    store: &Store,
    chat_id: i64,
    user_id: i64,
    new_name: &str,
) -> Result<Response, StoreError> {
    if new_name.is_empty() {
        return Ok(Response::error("Missing parameters"));
    }
    store.with_tx(|tx| {
        let Some(chat) = chats::find(tx, chat_id)? else {
            return Ok(Response::error("Chat not found"));
        };
        if !chats::is_participant(tx, chat_id, user_id)? {
            return Ok(Response::error("Not a participant"));
        }
        let Some(actor) = users::find_by_id(tx, user_id)? else {
            return Ok(Response::error("User not found"));
        };
        let old_name = chat.name.unwrap_or_else(|| "unnamed".to_string());
        chats::set_name(tx, chat_id, new_name)?;
        system_message(
            tx,
            chat_id,
            user_id,
            &format!(
                "{} changed the chat name from '{old_name}' to '{new_name}'",
                actor.username
            ),
        )?;
        Ok(Response::success())
    })
}

/// Adds a user to a chat on behalf of an existing participant.
pub fn add_participant(
    store: &Store,
    chat_id: i64,
    user_id: i64,
    participant_id: i64,
) -> Result<Response, StoreError> {
    store.with_tx(|tx| {
        if !chats::is_participant(tx, chat_id, user_id)? {
            return Ok(Response::error("Not a participant"));
        }
        if chats::is_participant(tx, chat_id, participant_id)? {
            return Ok(Response::error("User already in chat"));
        }
        let (Some(actor), Some(added)) = (
            users::find_by_id(tx, user_id)?,
            users::find_by_id(tx, participant_id)?,
        ) else {
            return Ok(Response::error("User not found"));
        };
        chats::add_participant(tx, chat_id, participant_id)?;
        system_message(
            tx,
            chat_id,
            user_id,
            &format!("{} added {} to the chat", actor.username, added.username),
        )?;
        tracing::info!(chat_id, participant_id, "participant added");
        Ok(Response::success())
    })
}

/// Removes a user from a chat on behalf of an existing participant.
pub fn remove_participant(
    store: &Store,
    chat_id: i64,
    user_id: i64,
    participant_id: i64,
) -> Result<Response, StoreError> {
    store.with_tx(|tx| {
        if !chats::is_participant(tx, chat_id, user_id)? {
            return Ok(Response::error("Not a participant"));
        }
        let (Some(actor), Some(removed)) = (
            users::find_by_id(tx, user_id)?,
            users::find_by_id(tx, participant_id)?,
        ) else {
            return Ok(Response::error("User not found"));
        };
        if !chats::remove_participant(tx, chat_id, participant_id)? {
            return Ok(Response::error("Not a member of this chat"));
        }
        system_message(
            tx,
            chat_id,
            user_id,
            &format!("{} removed {} from the chat", actor.username, removed.username),
        )?;
        tracing::info!(chat_id, participant_id, "participant removed");
        Ok(Response::success())
    })
}

/// Lists a chat's participants with presence recomputed and persisted first,
/// so the shown status is never staler than the liveness window.
pub fn get_chat_participants(store: &Store, chat_id: i64) -> Result<Response, StoreError> {
    store.with_tx(|tx| {
        let mut members = chats::participants(tx, chat_id)?;
        presence::refresh(tx, &mut members, Utc::now())?;
        let entries: Vec<_> = members.iter().map(user_entry).collect();
        Ok(Response::success()
            .with_serialized("participants", &entries)?
            .with_field("chat_id", chat_id))
    })
}

fn system_message(tx: &Transaction<'_>, chat_id: i64, user_id: i64, text: &str) -> Result<(), StoreError> {
    messages::insert(tx, user_id, chat_id, text, Utc::now(), true)?;
    Ok(())
}
