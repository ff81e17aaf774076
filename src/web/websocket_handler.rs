use axum::{
    extract::{
        ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::stream::StreamExt;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::web::models::WsMessage;
use crate::web::AppState;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn send_message(socket: &mut WebSocket, message: &WsMessage) -> bool {
    match serde_json::to_string(message) {
        Ok(json_data) => socket
            .send(Message::Text(Utf8Bytes::from(json_data)))
            .await
            .is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to serialize push message.");
            true
        }
    }
}

async fn handle_socket(mut socket: WebSocket, app_state: Arc<AppState>) {
    // Subscribe before the snapshot so no tick is missed in between.
    let mut rx = app_state.status_tx.subscribe();
    info!(clients = app_state.status_tx.receiver_count(), "Status client connected.");

    // 1. Fresh snapshot so the page does not wait for the next tick.
    match app_state.docker.list_containers().await {
        Ok(containers) => {
            if !send_message(&mut socket, &WsMessage::StatusUpdate(containers)).await {
                debug!("Client went away before the initial snapshot.");
                return;
            }
        }
        Err(e) => debug!(error = %e, "Initial snapshot failed; waiting for the poller."),
    }

    // 2. Relay broadcasts until either side goes away.
    loop {
        tokio::select! {
            update = rx.recv() => {
                match update {
                    Ok(message) => {
                        if !send_message(&mut socket, &message).await {
                            debug!("Error sending status update. Closing connection.");
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped = skipped, "Status client lagged; skipping stale updates.");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            incoming = socket.next() => {
                match incoming {
                    Some(Ok(Message::Text(t))) => {
                        if t.as_str() == "ping"
                            && socket.send(Message::Text(Utf8Bytes::from("pong"))).await.is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(p))) => {
                        if socket.send(Message::Pong(p)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(error = %e, "WebSocket receive error.");
                        break;
                    }
                }
            }
        }
    }
    info!("Status client disconnected.");
}
