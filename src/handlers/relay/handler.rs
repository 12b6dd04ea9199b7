//! Session bridge between the downstream client and the upstream realtime
//! speech endpoint.
//!
//! One session runs two long-lived forwarding loops concurrently, plus a
//! dedicated sender task owning the downstream sink:
//!
//! - downstream→upstream: applies session-config interception, forwards
//!   everything else untouched
//! - upstream→downstream: captures transcript turns (spawning one detached
//!   sidecar task per user turn), forwards the original message unmodified
//!
//! Either loop ending — peer close or transport failure — ends the session.
//! The other leg is torn down and outstanding sidecar tasks are left to
//! finish on their own; late injections fail silently in the sender.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use futures_util::stream::{SplitSink, SplitStream};
use tokio_tungstenite::tungstenite::Message as UpstreamMessage;
use tracing::{debug, info, warn};

use crate::auth::Auth;
use crate::core::relay::{
    DownstreamSender, Session, SessionState, Transcript, TurnRole, UpstreamStream, capture_turn,
    intercept, upstream,
};
use crate::core::sidecar::{SidecarAnalyzer, run_analysis};
use crate::state::AppState;

/// Maximum WebSocket frame size (10 MB)
const MAX_WS_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Maximum WebSocket message size (10 MB)
const MAX_WS_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Close code when the upstream credential is not configured (policy violation).
const CLOSE_MISSING_CREDENTIAL: u16 = 1008;

/// Close code when the upstream leg cannot be established (private range).
const CLOSE_UPSTREAM_UNAVAILABLE: u16 = 4502;

/// How one forwarding loop ended.
#[derive(Debug)]
enum LoopEnd {
    /// The peer closed its connection normally
    PeerClosed,
    /// A send or receive failed mid-session
    Transport(String),
}

/// Relay WebSocket handler.
///
/// Upgrades the HTTP connection and hands the socket to the session bridge.
pub async fn relay_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<Auth>,
) -> Response {
    info!(auth_id = ?auth.id, "Relay WebSocket connection upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_relay_socket(socket, state))
}

/// Run one relay session over an accepted downstream socket.
async fn handle_relay_socket(socket: WebSocket, state: Arc<AppState>) {
    let session = Session::new();
    info!(session_id = %session.id(), "Relay session starting");

    let (mut ws_sender, ws_receiver) = socket.split();

    let Some(api_key) = state.config.openai_api_key.clone() else {
        warn!(session_id = %session.id(), "Upstream credential not configured, refusing relay session");
        let _ = ws_sender
            .send(Message::Close(Some(CloseFrame {
                code: CLOSE_MISSING_CREDENTIAL,
                reason: "missing upstream credential".into(),
            })))
            .await;
        session.advance(SessionState::Closed);
        return;
    };

    // Single attempt; failure tears the session down with a distinguishable
    // close code.
    let upstream_socket = match upstream::connect(&state.config, &api_key).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(session_id = %session.id(), error = %e, "Relay session failed to establish upstream leg");
            let _ = ws_sender
                .send(Message::Close(Some(CloseFrame {
                    code: CLOSE_UPSTREAM_UNAVAILABLE,
                    reason: "upstream unavailable".into(),
                })))
                .await;
            session.advance(SessionState::Closed);
            return;
        }
    };

    session.advance(SessionState::Active);

    let (upstream_sink, upstream_stream) = upstream_socket.split();
    let (downstream, sender_task) = DownstreamSender::spawn(ws_sender);

    let mut downstream_to_upstream = tokio::spawn(client_to_upstream(
        ws_receiver,
        upstream_sink,
        state.config.transcription_model.clone(),
    ));
    let mut upstream_to_downstream = tokio::spawn(upstream_to_client(
        upstream_stream,
        downstream.clone(),
        state.analyzer.clone(),
    ));

    // Either loop ending ends the session; the other leg is dropped.
    let closing = tokio::select! {
        end = &mut downstream_to_upstream => {
            upstream_to_downstream.abort();
            log_loop_end(&session, "downstream->upstream", end);
            SessionState::ClosingDownstream
        }
        end = &mut upstream_to_downstream => {
            downstream_to_upstream.abort();
            log_loop_end(&session, "upstream->downstream", end);
            SessionState::ClosingUpstream
        }
    };
    session.advance(closing);

    // Close the downstream socket and stop the sender task. Sidecar tasks
    // still in flight keep their sender clones; their eventual injections
    // are dropped silently once the task below has exited.
    downstream.close(None).await;
    let _ = sender_task.await;

    session.advance(SessionState::Closed);
    info!(session_id = %session.id(), "Relay session terminated");
}

fn log_loop_end(
    session: &Session,
    direction: &str,
    end: Result<LoopEnd, tokio::task::JoinError>,
) {
    match end {
        Ok(LoopEnd::PeerClosed) => {
            info!(session_id = %session.id(), direction, "Forwarding loop ended: peer closed")
        }
        Ok(LoopEnd::Transport(reason)) => {
            warn!(session_id = %session.id(), direction, %reason, "Forwarding loop ended: transport error")
        }
        Err(e) => {
            warn!(session_id = %session.id(), direction, "Forwarding loop join failed: {e}")
        }
    }
}

/// Downstream→upstream forwarding loop.
///
/// Session-configuration messages are rewritten per the interception rules;
/// every other message is forwarded byte-identical.
async fn client_to_upstream(
    mut receiver: SplitStream<WebSocket>,
    mut upstream: SplitSink<UpstreamStream, UpstreamMessage>,
    transcription_model: String,
) -> LoopEnd {
    while let Some(received) = receiver.next().await {
        let message = match received {
            Ok(message) => message,
            Err(e) => return LoopEnd::Transport(format!("downstream receive failed: {e}")),
        };

        let outbound = match message {
            Message::Text(text) => {
                match intercept::rewrite_client_message(text.as_str(), &transcription_model) {
                    Some(rewritten) => UpstreamMessage::Text(rewritten.into()),
                    None => UpstreamMessage::Text(text.as_str().into()),
                }
            }
            Message::Binary(data) => UpstreamMessage::Binary(data),
            // Keepalive frames are transport-level, not relayed.
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => return LoopEnd::PeerClosed,
        };

        if let Err(e) = upstream.send(outbound).await {
            return LoopEnd::Transport(format!("upstream send failed: {e}"));
        }
    }
    LoopEnd::PeerClosed
}

/// Upstream→downstream forwarding loop with transcript capture.
///
/// The transcript has exactly one writer: this loop. Sidecar tasks get a
/// snapshot taken at trigger time, one invocation per user turn, with no
/// coalescing.
async fn upstream_to_client(
    mut upstream: SplitStream<UpstreamStream>,
    downstream: DownstreamSender,
    analyzer: Option<Arc<SidecarAnalyzer>>,
) -> LoopEnd {
    let mut transcript = Transcript::new();

    while let Some(received) = upstream.next().await {
        let message = match received {
            Ok(message) => message,
            Err(e) => return LoopEnd::Transport(format!("upstream receive failed: {e}")),
        };

        match message {
            UpstreamMessage::Text(text) => {
                if let Some(turn) = capture_turn(text.as_str()) {
                    let triggers_analysis = turn.role == TurnRole::User;
                    debug!(
                        role = ?turn.role,
                        chars = turn.text.len(),
                        turns = transcript.len() + 1,
                        "Captured transcript turn"
                    );
                    transcript.push(turn);

                    if triggers_analysis
                        && let Some(analyzer) = &analyzer
                    {
                        tokio::spawn(run_analysis(
                            analyzer.clone(),
                            transcript.snapshot(),
                            downstream.clone(),
                        ));
                    }
                }

                // Forward the original message regardless of capture.
                if let Err(e) = downstream.forward_text(text.as_str().to_owned()).await {
                    return LoopEnd::Transport(e.to_string());
                }
            }
            UpstreamMessage::Binary(data) => {
                if let Err(e) = downstream.forward_binary(data).await {
                    return LoopEnd::Transport(e.to_string());
                }
            }
            UpstreamMessage::Ping(_) | UpstreamMessage::Pong(_) | UpstreamMessage::Frame(_) => {}
            UpstreamMessage::Close(_) => return LoopEnd::PeerClosed,
        }
    }
    LoopEnd::PeerClosed
}
