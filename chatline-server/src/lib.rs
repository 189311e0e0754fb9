//! Chatline server library.
//!
//! Exposes the session engine for use in tests and embedding: the TCP
//! listener and per-connection handler, the request dispatcher and business
//! handlers, the SQLite-backed data access layer, and the presence
//! estimator.

pub mod auth;
pub mod config;
pub mod handlers;
pub mod presence;
pub mod server;
pub mod store;
