//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and manages the connection lifecycle.

use axum::{
    extract::{
        ws::{Message as WsFrame, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use std::sync::Arc;
use uuid::Uuid;

use super::messages::{ClientMessage, ServerMessage};
use crate::api::AppState;

/// WebSocket upgrade handler
///
/// This is the entry point for WebSocket connections.
/// It upgrades the HTTP connection and opens a message subscription.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = Uuid::new_v4().to_string();
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before greeting the client, so no message published after
    // the greeting can be missed
    let mut stream = match state.chat.subscribe().await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(connection_id = %connection_id, error = %e, "Subscription failed");
            let _ = send_frame(
                &mut sender,
                &ServerMessage::Error {
                    message: e.to_string(),
                },
            )
            .await;
            return;
        }
    };

    let connected = ServerMessage::Connected {
        connection_id: connection_id.clone(),
    };
    if send_frame(&mut sender, &connected).await.is_err() {
        tracing::debug!(connection_id = %connection_id, "Client gone before greeting");
        return;
    }

    tracing::info!(connection_id = %connection_id, "WebSocket connected");

    // One loop owns the sink: delivered messages and client frames are
    // interleaved here, and dropping `stream` on exit releases the
    // subscription slot
    loop {
        tokio::select! {
            delivered = stream.next() => {
                match delivered {
                    Some(message) => {
                        let frame = ServerMessage::MessageAdded { message };
                        if send_frame(&mut sender, &frame).await.is_err() {
                            tracing::debug!(
                                connection_id = %connection_id,
                                "WebSocket send failed, closing connection"
                            );
                            break;
                        }
                    }
                    // Broker side went away; nothing more will arrive
                    None => break,
                }
            }
            incoming = next_frame(&mut receiver) => {
                match incoming {
                    Some(frame) => {
                        if !handle_client_frame(&mut sender, &connection_id, frame).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!(connection_id = %connection_id, "WebSocket disconnected");
}

/// Receive the next frame, mapping transport errors to connection end
async fn next_frame(receiver: &mut SplitStream<WebSocket>) -> Option<WsFrame> {
    match receiver.next().await {
        Some(Ok(frame)) => Some(frame),
        Some(Err(e)) => {
            tracing::debug!(error = %e, "WebSocket receive error");
            None
        }
        None => None,
    }
}

/// Handle a received WebSocket frame
///
/// Returns false if the connection should be closed.
async fn handle_client_frame(
    sender: &mut SplitSink<WebSocket, WsFrame>,
    connection_id: &str,
    frame: WsFrame,
) -> bool {
    match frame {
        WsFrame::Text(text) => {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Ping) => {
                    let _ = send_frame(sender, &ServerMessage::Pong).await;
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        error = %e,
                        text = %text,
                        "Invalid client message"
                    );
                    // Report but keep the connection open
                    let error = ServerMessage::Error {
                        message: format!("Invalid message format: {}", e),
                    };
                    let _ = send_frame(sender, &error).await;
                }
            }
            true
        }
        WsFrame::Binary(_) => {
            let error = ServerMessage::Error {
                message: "Binary messages not supported".to_string(),
            };
            let _ = send_frame(sender, &error).await;
            true
        }
        // Axum answers pings automatically; a pong means the peer is alive
        WsFrame::Ping(_) | WsFrame::Pong(_) => true,
        WsFrame::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            false
        }
    }
}

/// Serialize and send a server frame
async fn send_frame(
    sender: &mut SplitSink<WebSocket, WsFrame>,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(message)
        .expect("server frames serialize infallibly");
    sender.send(WsFrame::Text(text)).await
}
