//! Persistent live feed over WebSocket
//!
//! On attach the client is registered with the broadcaster and receives a
//! `connected` snapshot before any broadcast. Client requests (`ping`, `get_state`,
//! `get_samples`) are answered on the same socket; anything unparseable is
//! ignored. A client that stays silent for the keep-alive period is pinged,
//! and a failed ping closes the connection. The socket is also closed when
//! the broadcaster drops the client after a failed delivery.

use crate::api::rest::state::AppState;
use crate::broadcast::{Broadcaster, Frame, PersistentSink};
use crate::error::TransportError;
use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use vibewatch_types::{ClientRequest, LiveMessage, SamplesPayload};

/// Upgrade to a WebSocket live feed
pub async fn websocket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state))
}

/// Write half of a WebSocket, shared by the broadcaster and request replies.
struct SocketSink {
    tx: Mutex<SplitSink<WebSocket, Message>>,
    /// Tripped when the broadcaster drops this client
    evicted: Notify,
}

#[async_trait]
impl PersistentSink for SocketSink {
    async fn send_text(&self, text: Frame) -> Result<(), TransportError> {
        let mut tx = self.tx.lock().await;
        send_frame(&mut tx, text).await
    }

    fn evicted(&self) {
        self.evicted.notify_one();
    }
}

async fn serve_socket(socket: WebSocket, state: AppState) {
    let service = Arc::clone(&state.service);
    let (tx, mut rx) = socket.split();
    let sink = Arc::new(SocketSink {
        tx: Mutex::new(tx),
        evicted: Notify::new(),
    });

    let keepalive = service.broadcaster().config().keepalive();
    let send_timeout = service.broadcaster().config().send_timeout();

    // Register while holding the write half so no broadcast can overtake the snapshot
    let subscription = {
        let mut tx = sink.tx.lock().await;
        let subscription = service.broadcaster().subscribe_persistent(sink.clone());
        let sent = match Broadcaster::encode(service.connected_message()) {
            Ok(frame) => tokio::time::timeout(send_timeout, send_frame(&mut tx, frame))
                .await
                .map_err(|_| TransportError::Timeout)
                .and_then(|r| r),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode WebSocket snapshot");
                Ok(())
            }
        };
        if sent.is_err() {
            return;
        }
        subscription
    };

    loop {
        let received = tokio::select! {
            _ = sink.evicted.notified() => {
                tracing::debug!(subscriber_id = %subscription.id(), "WebSocket dropped from live feed");
                break;
            }
            received = tokio::time::timeout(keepalive, rx.next()) => received,
        };

        let message = match received {
            Ok(Some(Ok(message))) => message,
            Ok(Some(Err(e))) => {
                tracing::debug!(error = %e, "WebSocket receive failed");
                break;
            }
            Ok(None) => break,
            Err(_) => {
                if reply(&sink, LiveMessage::Ping, send_timeout).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let request = match serde_json::from_str::<ClientRequest>(&text) {
            Ok(request) => request,
            Err(e) => {
                tracing::trace!(error = %e, "Ignoring unrecognized client message");
                continue;
            }
        };

        let response = match request {
            ClientRequest::Ping => LiveMessage::Pong,
            ClientRequest::GetState => service.state_message(),
            ClientRequest::GetSamples { limit } => LiveMessage::Samples(SamplesPayload {
                samples: service.recent_samples(limit),
            }),
        };

        if reply(&sink, response, send_timeout).await.is_err() {
            break;
        }
    }

    drop(subscription);
    if let Ok(mut tx) = tokio::time::timeout(send_timeout, sink.tx.lock()).await {
        let _ = tx.close().await;
    }
    tracing::debug!("WebSocket closed");
}

async fn send_frame(
    tx: &mut SplitSink<WebSocket, Message>,
    frame: Frame,
) -> Result<(), TransportError> {
    tx.send(Message::Text(frame.to_string()))
        .await
        .map_err(|_| TransportError::Closed)
}

async fn reply(
    sink: &SocketSink,
    message: LiveMessage,
    timeout: Duration,
) -> Result<(), TransportError> {
    let frame = match Broadcaster::encode(message) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode WebSocket reply");
            return Ok(());
        }
    };

    tokio::time::timeout(timeout, sink.send_text(frame))
        .await
        .map_err(|_| TransportError::Timeout)?
}
