//! Local WebSocket ingestion listener.
//!
//! Accepts any number of clients and forwards every JSON object received as
//! a frame, verbatim and in arrival order, to a single consumer.

pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod server;
