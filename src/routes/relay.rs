//! Relay WebSocket route configuration.
//!
//! This module configures the WebSocket endpoint that bridges browser
//! clients to the upstream realtime speech endpoint.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::relay::relay_handler;
use crate::state::AppState;

/// Create the relay WebSocket router.
///
/// # Endpoint
///
/// `GET /ws/relay` - WebSocket upgrade for the realtime voice relay
///
/// # Protocol
///
/// After the upgrade, text frames carry realtime protocol events in both
/// directions. The relay rewrites `session.update` messages (tools stripped,
/// input transcription forced on) and injects synthetic
/// `response.function_call_arguments.done` events carrying sidecar analysis
/// results. Everything else passes through unmodified.
///
/// # Authentication
///
/// Uses the same auth middleware as the REST endpoints; browser clients may
/// supply the bearer token as a `?token=` query parameter.
pub fn create_relay_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws/relay", get(relay_handler))
        .layer(TraceLayer::new_for_http())
}
