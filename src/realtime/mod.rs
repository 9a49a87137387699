use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        FromRef, State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{auth::jwt::JwtKeys, state::AppState};

pub mod events;
pub mod rooms;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_connection(socket, state))
}

/// Expected first frame: `{"event":"join","token":"<jwt>"}`. The room is
/// taken from the verified token, never from a client-supplied id.
#[derive(Debug, Deserialize)]
struct JoinFrame {
    event: String,
    token: String,
}

async fn handle_connection(socket: WebSocket, state: AppState) {
    info!("websocket client connected");
    let (mut sender, mut receiver) = socket.split();

    let Some(user_id) = await_join(&mut receiver, &state).await else {
        warn!("websocket join rejected");
        let _ = sender.send(Message::Close(None)).await;
        return;
    };
    info!(%user_id, "websocket client joined room");

    let mut events = state.rooms.join(user_id);
    forward_events(&mut sender, &mut receiver, &mut events, user_id).await;

    // The receiver must be gone before pruning, or the room looks occupied.
    drop(events);
    state.rooms.prune(user_id);
    info!(%user_id, "websocket client disconnected");
}

async fn await_join(receiver: &mut SplitStream<WebSocket>, state: &AppState) -> Option<Uuid> {
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => {
                let frame: JoinFrame = serde_json::from_str(&text).ok()?;
                if frame.event != "join" {
                    return None;
                }
                let keys = JwtKeys::from_ref(state);
                return keys.verify(&frame.token).ok().map(|claims| claims.sub);
            }
            Message::Close(_) => return None,
            // Pings and binary noise before the join are ignored.
            _ => continue,
        }
    }
    None
}

async fn forward_events(
    sender: &mut SplitSink<WebSocket, Message>,
    receiver: &mut SplitStream<WebSocket>,
    events: &mut broadcast::Receiver<events::RoomEvent>,
    user_id: Uuid,
) {
    let mut ping = tokio::time::interval(Duration::from_secs(30));
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(evt) => {
                    let Ok(json) = serde_json::to_string(&evt) else { continue };
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    debug!(missed, %user_id, "websocket client lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            msg = receiver.next() => match msg {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            _ = ping.tick() => {
                if sender.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }
}
