//! WebSocket connection handler

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::Response,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use super::state::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    ws.on_upgrade(move |socket| handle_socket(socket, peer, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(mut socket: WebSocket, peer: Option<SocketAddr>, state: Arc<AppState>) {
    // Subscribe before announcing so the client receives its own join notice
    let mut rx = state.subscribe();
    let (session, _) = state.on_client_connected(peer).await;
    let client_id = session.client_id;

    loop {
        tokio::select! {
            biased;

            // Broadcast frames to client
            result = rx.recv() => {
                match result {
                    Ok(frame) => {
                        debug!(client_id, seq = frame.sequence_id, "sending frame");
                        if socket.send(Message::Text(frame.text)).await.is_err() {
                            break; // Client disconnected
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        // Client is too slow; it simply misses those frames
                        warn!(client_id, skipped = n, "client lagging, frames dropped");
                    }
                    Err(RecvError::Closed) => {
                        break; // Channel closed
                    }
                }
            }

            // Server shutting down: flush what is queued, then close
            _ = state.shutdown.cancelled() => {
                while let Ok(frame) = rx.try_recv() {
                    if socket.send(Message::Text(frame.text)).await.is_err() {
                        break;
                    }
                }
                let _ = socket.send(Message::Close(None)).await;
                break;
            }

            // Client frames are only read to notice disconnects
            result = socket.recv() => {
                match result {
                    Some(Ok(msg)) => {
                        if !handle_client_message(msg, &mut socket).await {
                            break; // Client requested close
                        }
                    }
                    Some(Err(_)) => break, // WebSocket error
                    None => break, // Client disconnected
                }
            }
        }
    }

    state.on_client_left(&client_id).await;
}

/// Handle a message from the client
/// Returns false if the connection should be closed
async fn handle_client_message(msg: Message, socket: &mut WebSocket) -> bool {
    match msg {
        Message::Text(text) => {
            debug!(len = text.len(), "ignoring client text frame");
            true
        }
        Message::Binary(_) => true, // Ignore binary messages
        Message::Ping(data) => {
            let _ = socket.send(Message::Pong(data)).await;
            true
        }
        Message::Pong(_) => true, // Ignore pong responses
        Message::Close(_) => false, // Client requested close
    }
}
