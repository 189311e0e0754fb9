//! Integration tests for participant management: adding, removing, listing,
//! and the system messages that record membership changes.

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{Value, json};
use tokio::net::TcpStream;

use chatline_proto::codec;
use chatline_proto::response::Response;
use chatline_server::server::{ServerState, start_server};
use chatline_server::store::Store;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn start() -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let store = Store::open_in_memory().expect("in-memory store");
    let state = Arc::new(ServerState::new(store));
    start_server("127.0.0.1:0", state)
        .await
        .expect("failed to start test server")
}

struct Client {
    stream: TcpStream,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect");
        Self { stream }
    }

    async fn send(&mut self, request: &Value) -> Response {
        let payload = codec::encode_payload(request).expect("encode");
        codec::write_frame(&mut self.stream, &payload)
            .await
            .expect("write frame");
        let bytes = codec::read_frame(&mut self.stream, codec::DEFAULT_MAX_FRAME_SIZE)
            .await
            .expect("read frame")
            .expect("server closed connection");
        serde_json::from_slice(&bytes).expect("decode response")
    }

    async fn sign_up(&mut self, username: &str) -> i64 {
        self.send(&json!({"type": "register", "username": username, "password": "Secret1!"}))
            .await;
        self.send(&json!({"type": "login", "username": username, "password": "Secret1!"}))
            .await
            .field_i64("user_id")
            .expect("user_id")
    }

    async fn participant_usernames(&mut self, chat_id: i64) -> Vec<String> {
        let resp = self
            .send(&json!({"type": "get_chat_participants", "chat_id": chat_id}))
            .await;
        resp.field("participants")
            .expect("participants")
            .as_array()
            .expect("array")
            .iter()
            .filter_map(|p| p["username"].as_str().map(String::from))
            .collect()
    }

    async fn last_message_text(&mut self, chat_id: i64) -> String {
        let resp = self
            .send(&json!({"type": "get_messages", "chat_id": chat_id}))
            .await;
        let messages = resp.field("messages").expect("messages").as_array().expect("array").clone();
        messages
            .last()
            .and_then(|m| m["text"].as_str())
            .expect("last message")
            .to_string()
    }
}

/// Signs up three users and creates a named group with the first two.
async fn group_of_two(client: &mut Client) -> (i64, i64, i64, i64) {
    let alice = client.sign_up("alice").await;
    let bob = client.sign_up("bob").await;
    let carol = client.sign_up("carol").await;
    let chat_id = client
        .send(&json!({
            "type": "create_chat",
            "user_id": alice,
            "participant_ids": [alice, bob],
            "is_group": true,
            "name": "team",
        }))
        .await
        .field_i64("chat_id")
        .expect("chat_id");
    (alice, bob, carol, chat_id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_participant_records_membership_and_system_message() {
    let (addr, handle) = start().await;
    let mut client = Client::connect(addr).await;
    let (alice, _bob, carol, chat_id) = group_of_two(&mut client).await;

    let resp = client
        .send(&json!({
            "type": "add_participant",
            "chat_id": chat_id,
            "user_id": alice,
            "participant_id": carol,
        }))
        .await;
    assert!(resp.is_success());

    assert_eq!(client.participant_usernames(chat_id).await, ["alice", "bob", "carol"]);
    assert_eq!(client.last_message_text(chat_id).await, "alice added carol to the chat");

    handle.abort();
}

#[tokio::test]
async fn only_participants_may_mutate_membership() {
    let (addr, handle) = start().await;
    let mut client = Client::connect(addr).await;
    let (_alice, bob, carol, chat_id) = group_of_two(&mut client).await;

    // Carol is not a member of the chat and may not add herself.
    let resp = client
        .send(&json!({
            "type": "add_participant",
            "chat_id": chat_id,
            "user_id": carol,
            "participant_id": carol,
        }))
        .await;
    assert_eq!(resp.message.as_deref(), Some("Not a participant"));

    let resp = client
        .send(&json!({
            "type": "remove_participant",
            "chat_id": chat_id,
            "user_id": carol,
            "participant_id": bob,
        }))
        .await;
    assert_eq!(resp.message.as_deref(), Some("Not a participant"));

    // Membership untouched; no system messages leaked out.
    assert_eq!(client.participant_usernames(chat_id).await, ["alice", "bob"]);
    let resp = client
        .send(&json!({"type": "get_messages", "chat_id": chat_id}))
        .await;
    assert!(resp.field("messages").expect("messages").as_array().expect("array").is_empty());

    handle.abort();
}

#[tokio::test]
async fn adding_existing_member_rejected() {
    let (addr, handle) = start().await;
    let mut client = Client::connect(addr).await;
    let (alice, bob, _carol, chat_id) = group_of_two(&mut client).await;

    let resp = client
        .send(&json!({
            "type": "add_participant",
            "chat_id": chat_id,
            "user_id": alice,
            "participant_id": bob,
        }))
        .await;
    assert_eq!(resp.message.as_deref(), Some("User already in chat"));

    handle.abort();
}

#[tokio::test]
async fn remove_participant_records_membership_and_system_message() {
    let (addr, handle) = start().await;
    let mut client = Client::connect(addr).await;
    let (alice, bob, _carol, chat_id) = group_of_two(&mut client).await;

    let resp = client
        .send(&json!({
            "type": "remove_participant",
            "chat_id": chat_id,
            "user_id": alice,
            "participant_id": bob,
        }))
        .await;
    assert!(resp.is_success());

    assert_eq!(client.participant_usernames(chat_id).await, ["alice"]);
    assert_eq!(
        client.last_message_text(chat_id).await,
        "alice removed bob from the chat"
    );

    handle.abort();
}

#[tokio::test]
async fn removing_non_member_rejected_without_system_message() {
    let (addr, handle) = start().await;
    let mut client = Client::connect(addr).await;
    let (alice, _bob, carol, chat_id) = group_of_two(&mut client).await;

    let resp = client
        .send(&json!({
            "type": "remove_participant",
            "chat_id": chat_id,
            "user_id": alice,
            "participant_id": carol,
        }))
        .await;
    assert_eq!(resp.message.as_deref(), Some("Not a member of this chat"));

    let resp = client
        .send(&json!({"type": "get_messages", "chat_id": chat_id}))
        .await;
    assert!(resp.field("messages").expect("messages").as_array().expect("array").is_empty());

    handle.abort();
}

#[tokio::test]
async fn participant_listing_carries_chat_id() {
    let (addr, handle) = start().await;
    let mut client = Client::connect(addr).await;
    let (_alice, _bob, _carol, chat_id) = group_of_two(&mut client).await;

    let resp = client
        .send(&json!({"type": "get_chat_participants", "chat_id": chat_id}))
        .await;
    assert!(resp.is_success());
    assert_eq!(resp.field_i64("chat_id"), Some(chat_id));

    handle.abort();
}
