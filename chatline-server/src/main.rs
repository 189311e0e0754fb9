//! Chatline server -- persistent multi-user TCP chat.
//!
//! Accepts framed JSON requests over TCP, persists users, chats, and
//! messages to SQLite, and answers each request with a framed JSON
//! response.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:5555
//! cargo run --bin chatline-server
//!
//! # Run on custom address with explicit database
//! cargo run --bin chatline-server -- --bind 127.0.0.1:6000 --db chat.db
//!
//! # Or via environment variables
//! CHATLINE_ADDR=127.0.0.1:6000 cargo run --bin chatline-server
//! ```

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use chatline_server::config::{CliArgs, ServerConfig};
use chatline_server::server::{self, ServerState};
use chatline_server::store::Store;

#[tokio::main]
async fn main() {
    let cli = CliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let _log_guard = init_logging(&config.log_level, config.log_file.as_deref());

    tracing::info!(addr = %config.bind_addr, db = %config.db_path.display(), "starting chatline server");

    let store = match Store::open(&config.db_path) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, db = %config.db_path.display(), "failed to open database");
            std::process::exit(1);
        }
    };

    let state = Arc::new(ServerState::with_config(config.max_frame_size, store));

    match server::start_server(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "chatline server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    }
}

/// Initializes tracing, writing to the given file when one is configured and
/// to stderr otherwise. Returns the appender guard that must outlive main.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if let Some(log_path) = file_path {
        let log_dir = log_path.parent()?;
        let file_name = log_path.file_name()?.to_str()?;

        let file_appender = tracing_appender::rolling::never(log_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::fmt()
            .with_writer(non_blocking)
            .with_env_filter(env_filter)
            .with_ansi(false)
            .init();

        Some(guard)
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
        None
    }
}
