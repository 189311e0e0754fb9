//! TCP server core: shared state, accept loop, and the per-connection
//! request/response cycle.
//!
//! Each accepted connection gets its own task that reads length-prefixed
//! frames, dispatches the decoded request, and writes the response back over
//! the same framing. Malformed requests answer with an error frame and keep
//! the connection; framing faults close it.

use std::sync::Arc;

use chatline_proto::codec::{self, DEFAULT_MAX_FRAME_SIZE, WireError};
use chatline_proto::request::Request;
use chatline_proto::response::Response;
use chrono::Utc;
use tokio::net::TcpStream;

use crate::handlers;
use crate::store::{Store, users};

/// Shared server state: the store plus the resolved frame size limit.
pub struct ServerState {
    /// Backing relational store, shared by every connection.
    pub store: Store,
    /// Maximum accepted frame payload size in bytes.
    max_frame_size: usize,
}

impl ServerState {
    /// Creates server state with the default frame size limit.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            store,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Creates server state with a custom frame size limit from the resolved
    /// [`crate::config::ServerConfig`].
    #[must_use]
    pub fn with_config(max_frame_size: usize, store: Store) -> Self {
        Self {
            store,
            max_frame_size,
        }
    }
}

/// Starts the server on the given address and returns the bound address and
/// a join handle.
///
/// This is the primary entry point used by both `main.rs` and test code.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
    state: Arc<ServerState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        tracing::debug!(%peer, "connection accepted");
                        handle_connection(stream, state).await;
                        tracing::debug!(%peer, "connection closed");
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    });

    Ok((bound_addr, handle))
}

/// Runs the request/response cycle for one connection until the client
/// disconnects or a framing fault makes the stream unusable.
///
/// The only per-connection session state is the user id captured from a
/// successful login response; it exists so the disconnect path can mark
/// that user offline.
async fn handle_connection(mut stream: TcpStream, state: Arc<ServerState>) {
    let mut session_user: Option<i64> = None;

    loop {
        let bytes = match codec::read_frame(&mut stream, state.max_frame_size).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => break,
            Err(e) => {
                log_wire_error(&e);
                break;
            }
        };

        let response = match Request::parse(&bytes) {
            Ok(request) => {
                let is_login = request.request_type() == "login";
                let response = handlers::dispatch(&state.store, request);
                if is_login && response.is_success() {
                    session_user = response.field_i64("user_id");
                }
                response
            }
            Err(e) => {
                tracing::debug!(error = %e, "rejected request payload");
                Response::error(e.to_string())
            }
        };

        let payload = match codec::encode_payload(&response) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode response");
                break;
            }
        };
        if let Err(e) = codec::write_frame(&mut stream, &payload).await {
            log_wire_error(&e);
            break;
        }
    }

    if let Some(user_id) = session_user {
        mark_offline(&state.store, user_id);
    }
}

fn log_wire_error(err: &WireError) {
    match err {
        WireError::Io(e) if e.kind() == std::io::ErrorKind::ConnectionReset => {
            tracing::debug!("connection reset by peer");
        }
        other => tracing::warn!(error = %other, "connection-fatal wire error"),
    }
}

/// Best-effort presence teardown on disconnect. Failures are logged and
/// swallowed; the connection is released either way.
fn mark_offline(store: &Store, user_id: i64) {
    let outcome = store.with_tx(|tx| users::set_presence(tx, user_id, false, Some(Utc::now())));
    match outcome {
        Ok(()) => tracing::info!(user_id, "user marked offline on disconnect"),
        Err(e) => tracing::warn!(user_id, error = %e, "failed to mark user offline"),
    }
}
