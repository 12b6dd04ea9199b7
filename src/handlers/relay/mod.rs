//! Relay WebSocket handler.
//!
//! Upgrades the downstream connection and runs the session bridge between
//! the browser client and the upstream realtime speech endpoint.

mod handler;

pub use handler::relay_handler;
