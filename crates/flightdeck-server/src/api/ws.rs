//! WebSocket position stream for one session.
//!
//! The socket receives the current state on connect, then every published
//! [`PositionUpdate`]. Text frames carrying a [`PlaybackCommand`] are applied
//! to the session, so a client can drive playback over the same connection.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast::error::RecvError;

use crate::api::error::ApiError;
use crate::api::sessions::lookup;
use crate::state::{AppState, PlaybackCommand, PositionUpdate, SessionRuntime};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let runtime = lookup(&state, &id)?;
    let rx = runtime.subscribe();
    let initial = runtime.current_update();
    // Only a weak handle lives in the socket task; deleting the session
    // closes the channel and ends the stream.
    let session = Arc::downgrade(&runtime);
    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, session, initial, rx))
        .into_response())
}

fn encode(update: &PositionUpdate) -> Option<Message> {
    match serde_json::to_string(update) {
        Ok(text) => Some(Message::Text(text)),
        Err(e) => {
            tracing::warn!("Failed to encode position update: {}", e);
            None
        }
    }
}

/// Apply a client command; the reply is an error frame or nothing, since
/// successful transitions arrive through the broadcast.
fn handle_command(session: &Weak<SessionRuntime>, text: &str) -> Option<Message> {
    let command: PlaybackCommand = match serde_json::from_str(text) {
        Ok(command) => command,
        Err(e) => return Some(Message::Text(json!({ "error": e.to_string() }).to_string())),
    };
    let runtime = session.upgrade()?;
    match runtime.apply(command) {
        Ok(_) => None,
        Err(e) => Some(Message::Text(json!({ "error": e.to_string() }).to_string())),
    }
}

async fn handle_socket(
    mut socket: WebSocket,
    session: Weak<SessionRuntime>,
    initial: PositionUpdate,
    mut rx: tokio::sync::broadcast::Receiver<PositionUpdate>,
) {
    let session_id = initial.session_id.clone();
    tracing::debug!(session = %session_id, "Stream subscriber connected");

    if let Some(msg) = encode(&initial) {
        if socket.send(msg).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_command(&session, &text) {
                            if socket.send(reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }
            event = rx.recv() => {
                match event {
                    Ok(update) => {
                        let Some(msg) = encode(&update) else { continue };
                        if socket.send(msg).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Drop missed updates; the next tick carries the current position.
                        tracing::debug!(session = %session_id, skipped, "Stream subscriber lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!(session = %session_id, "Stream subscriber disconnected");
}
