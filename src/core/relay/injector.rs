//! Serialized downstream send path and event injection.
//!
//! The downstream socket is written by the upstream→downstream forwarding
//! loop and by any number of concurrent sidecar tasks. A single sender task
//! owns the sink; everyone else routes through its channel, so exactly one
//! send is in flight at a time and frames are never interleaved.

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use bytes::Bytes;
use futures_util::SinkExt;
use futures_util::stream::SplitSink;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::error::{RelayError, RelayResult};
use super::events::InjectedToolCall;

/// Channel buffer size for the downstream send path.
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Message routed to the downstream sender task.
#[derive(Debug)]
pub enum RelayRoute {
    /// Forwarded or injected text frame
    Text(String),
    /// Forwarded binary frame
    Binary(Bytes),
    /// Close the downstream socket and stop the sender task
    Close(Option<CloseFrame>),
}

/// Handle for writing to the downstream connection.
///
/// Cloneable; sidecar tasks hold one past session teardown. Once the sender
/// task has exited, every send fails and injected events are dropped
/// silently — the expected race when a session ends with analysis in flight.
#[derive(Debug, Clone)]
pub struct DownstreamSender {
    tx: mpsc::Sender<RelayRoute>,
}

impl DownstreamSender {
    /// Spawn the sender task that owns the downstream sink.
    pub fn spawn(mut sink: SplitSink<WebSocket, Message>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<RelayRoute>(CHANNEL_BUFFER_SIZE);

        let handle = tokio::spawn(async move {
            while let Some(route) = rx.recv().await {
                let should_close = matches!(route, RelayRoute::Close(_));

                let result = match route {
                    RelayRoute::Text(text) => sink.send(Message::Text(text.into())).await,
                    RelayRoute::Binary(data) => sink.send(Message::Binary(data)).await,
                    RelayRoute::Close(frame) => sink.send(Message::Close(frame)).await,
                };

                if let Err(e) = result {
                    debug!("Downstream send failed, stopping sender task: {e}");
                    break;
                }
                if should_close {
                    break;
                }
            }
        });

        (Self { tx }, handle)
    }

    #[cfg(test)]
    pub(crate) fn from_channel(tx: mpsc::Sender<RelayRoute>) -> Self {
        Self { tx }
    }

    /// Forward one text frame in receipt order.
    pub async fn forward_text(&self, text: String) -> RelayResult<()> {
        self.tx
            .send(RelayRoute::Text(text))
            .await
            .map_err(|_| RelayError::Transport("downstream sender closed".to_string()))
    }

    /// Forward one binary frame in receipt order.
    pub async fn forward_binary(&self, data: Bytes) -> RelayResult<()> {
        self.tx
            .send(RelayRoute::Binary(data))
            .await
            .map_err(|_| RelayError::Transport("downstream sender closed".to_string()))
    }

    /// Close the downstream socket, optionally with a close frame.
    pub async fn close(&self, frame: Option<CloseFrame>) {
        let _ = self.tx.send(RelayRoute::Close(frame)).await;
    }

    /// Inject a synthetic tool-call event, best effort.
    ///
    /// A failed send means the session already ended; the event is dropped
    /// and the drop is logged, never escalated.
    pub async fn inject(&self, event: InjectedToolCall) {
        let call_id = event.call_id.clone();
        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                error!(call_id = %call_id, "Failed to serialize injected event: {e}");
                return;
            }
        };

        match self.tx.send(RelayRoute::Text(json)).await {
            Ok(()) => debug!(call_id = %call_id, "Injected sidecar event into downstream stream"),
            Err(_) => {
                let dropped = RelayError::InjectionDropped;
                warn!(call_id = %call_id, "{dropped}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inject_after_close_is_silent() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let sender = DownstreamSender::from_channel(tx);

        // Must not panic or error; the drop is absorbed.
        sender
            .inject(InjectedToolCall::new("{}".to_string()))
            .await;
    }

    #[tokio::test]
    async fn test_forward_after_close_reports_transport_error() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let sender = DownstreamSender::from_channel(tx);

        let err = sender.forward_text("{}".to_string()).await.unwrap_err();
        assert!(matches!(err, RelayError::Transport(_)));
    }

    #[tokio::test]
    async fn test_injected_events_arrive_as_text_routes() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = DownstreamSender::from_channel(tx);

        sender
            .inject(InjectedToolCall::new(r#"{"isComplete":false}"#.to_string()))
            .await;

        match rx.recv().await.unwrap() {
            RelayRoute::Text(json) => {
                let value: serde_json::Value = serde_json::from_str(&json).unwrap();
                assert_eq!(value["type"], "response.function_call_arguments.done");
                assert_eq!(value["arguments"], r#"{"isComplete":false}"#);
            }
            other => panic!("Expected Text route, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_concurrent_injections_all_delivered_once() {
        let (tx, mut rx) = mpsc::channel(64);
        let sender = DownstreamSender::from_channel(tx);

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let sender = sender.clone();
                tokio::spawn(async move {
                    sender
                        .inject(InjectedToolCall::new(format!(r#"{{"n":{i}}}"#)))
                        .await;
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }
        drop(sender);

        let mut call_ids = std::collections::HashSet::new();
        while let Some(route) = rx.recv().await {
            match route {
                RelayRoute::Text(json) => {
                    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
                    assert!(call_ids.insert(value["call_id"].as_str().unwrap().to_string()));
                }
                other => panic!("Expected Text route, got {other:?}"),
            }
        }
        assert_eq!(call_ids.len(), 16);
    }
}
