//! Integration tests for the registration, login, and profile flows, run
//! against a real server over TCP.

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

/// One framed client connection.
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

    async fn register(&mut self, username: &str, password: &str) -> Response {
        self.send(&json!({"type": "register", "username": username, "password": password}))
            .await
    }

    async fn login(&mut self, username: &str, password: &str) -> Response {
        self.send(&json!({"type": "login", "username": username, "password": password}))
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_then_login_round_trip() {
    let (addr, handle) = start().await;
    let mut client = Client::connect(addr).await;

    let resp = client.register("alice", "Secret1!").await;
    assert!(resp.is_success());
    assert_eq!(resp.message.as_deref(), Some("User registered successfully"));

    let resp = client.login("alice", "Secret1!").await;
    assert!(resp.is_success());
    assert_eq!(resp.message.as_deref(), Some("Login successful"));
    assert!(resp.field_i64("user_id").is_some());
    assert_eq!(resp.field_str("name"), Some("alice"));

    handle.abort();
}

#[tokio::test]
async fn duplicate_username_rejected() {
    let (addr, handle) = start().await;
    let mut client = Client::connect(addr).await;

    assert!(client.register("alice", "Secret1!").await.is_success());
    let resp = client.register("alice", "Other1!!").await;
    assert_eq!(resp.message.as_deref(), Some("Username already exists"));

    handle.abort();
}

#[tokio::test]
async fn wrong_password_rejected_with_same_error_as_unknown_user() {
    let (addr, handle) = start().await;
    let mut client = Client::connect(addr).await;
    client.register("alice", "Secret1!").await;

    let wrong = client.login("alice", "WrongPass1!").await;
    let unknown = client.login("nobody", "Secret1!").await;
    assert_eq!(wrong.message.as_deref(), Some("Invalid credentials"));
    assert_eq!(unknown.message.as_deref(), Some("Invalid credentials"));

    handle.abort();
}

#[tokio::test]
async fn profile_update_changes_username_and_password() {
    let (addr, handle) = start().await;
    let mut client = Client::connect(addr).await;
    client.register("alice", "Secret1!").await;
    let user_id = client
        .login("alice", "Secret1!")
        .await
        .field_i64("user_id")
        .expect("user_id");

    let resp = client
        .send(&json!({
            "type": "update_profile",
            "user_id": user_id,
            "new_username": "alicia",
            "password": "Secret1!",
            "new_password": "Changed1!",
            "old_password": "Secret1!",
        }))
        .await;
    assert!(resp.is_success());
    assert_eq!(resp.field_str("new_username"), Some("alicia"));

    assert!(!client.login("alice", "Secret1!").await.is_success());
    assert!(client.login("alicia", "Changed1!").await.is_success());

    handle.abort();
}

#[tokio::test]
async fn profile_update_is_all_or_nothing() {
    let (addr, handle) = start().await;
    let mut client = Client::connect(addr).await;
    client.register("alice", "Secret1!").await;
    let user_id = client
        .login("alice", "Secret1!")
        .await
        .field_i64("user_id")
        .expect("user_id");

    // Valid name change combined with a bad password proof fails as a whole.
    let resp = client
        .send(&json!({
            "type": "update_profile",
            "user_id": user_id,
            "new_name": "Alice A.",
            "new_username": "alicia",
            "password": "wrong",
        }))
        .await;
    assert_eq!(resp.message.as_deref(), Some("Invalid password"));

    let resp = client.login("alice", "Secret1!").await;
    assert_eq!(resp.field_str("name"), Some("alice"));

    handle.abort();
}

#[tokio::test]
async fn get_users_reflects_registrations() {
    let (addr, handle) = start().await;
    let mut client = Client::connect(addr).await;
    client.register("alice", "Secret1!").await;
    client.register("bob", "Secret1!").await;

    let resp = client.send(&json!({"type": "get_users"})).await;
    assert!(resp.is_success());
    let users = resp.field("users").expect("users").as_array().expect("array").clone();
    let names: Vec<&str> = users.iter().filter_map(|u| u["username"].as_str()).collect();
    assert_eq!(names, ["alice", "bob"]);

    handle.abort();
}
