//! Request dispatcher and business handlers.
//!
//! [`dispatch`] is a pure routing table from request type to handler; it
//! performs no business logic itself. Handlers return `Ok(response)` for
//! every outcome a client can cause — success, validation failure, state
//! conflict — and `Err` only for internal faults (storage or serialization),
//! which the dispatch boundary downgrades to a generic error response so the
//! connection survives.

pub mod auth;
pub mod chats;
pub mod messages;

use chatline_proto::request::Request;
use chatline_proto::response::{Response, UserEntry};

use crate::store::models::User;
use crate::store::{Store, StoreError};

/// Routes one request to its handler and flattens internal faults into an
/// error response.
pub fn dispatch(store: &Store, request: Request) -> Response {
    let request_type = request.request_type();
    match route(store, request) {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(request_type, error = %err, "internal fault while handling request");
            Response::error("Internal server error")
        }
    }
}

fn route(store: &Store, request: Request) -> Result<Response, StoreError> {
    match request {
        Request::Register { username, password } => auth::register(store, &username, &password),
        Request::Login { username, password } => auth::login(store, &username, &password),
        Request::UpdateProfile {
            user_id,
            new_name,
            new_username,
            password,
            new_password,
            old_password,
        } => auth::update_profile(
            store,
            &auth::ProfileUpdate {
                user_id,
                new_name,
                new_username,
                password,
                new_password,
                old_password,
            },
        ),
        Request::GetUsers { force_update } => auth::get_users(store, force_update),
        Request::CreateChat {
            user_id,
            participant_ids,
            is_group,
            name,
        } => chats::create_chat(store, user_id, &participant_ids, is_group, name.as_deref()),
        Request::GetChats { user_id, username } => {
            chats::get_user_chats(store, user_id, &username)
        }
        Request::UpdateChatName {
            chat_id,
            new_name,
            user_id,
        } => chats::update_chat_name(store, chat_id, user_id, &new_name),
        Request::GetChatParticipants { chat_id } => chats::get_chat_participants(store, chat_id),
        Request::AddParticipant {
            chat_id,
            user_id,
            participant_id,
        } => chats::add_participant(store, chat_id, user_id, participant_id),
        Request::RemoveParticipant {
            chat_id,
            user_id,
            participant_id,
        } => chats::remove_participant(store, chat_id, user_id, participant_id),
        Request::SendMessage {
            user_id,
            chat_id,
            text,
        } => messages::send_message(store, user_id, chat_id, &text),
        Request::GetMessages { chat_id } => messages::get_messages(store, chat_id),
    }
}

/// Projects a stored user into its wire representation.
pub(crate) fn user_entry(user: &User) -> UserEntry {
    UserEntry {
        id: user.id,
        username: user.username.clone(),
        name: user.display_name().to_string(),
        online: user.online,
    }
}
