//! Realtime moderation channel over WebSocket
//!
//! Wire format is a JSON envelope `{"event": ..., "data": {...}}` in both
//! directions. Inbound `send_message` runs the safety checker and publishes
//! a `message_response` on the event bus, so every connected client — the
//! sender included — receives it. Checker failures answer only the sending
//! connection. `focus_status` events published by the store are forwarded
//! the same way.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use modwatch_core::{check_safety, ChannelEvent, MessageResponse, ModerationStore};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::router::AppState;

/// Inbound envelope from a client.
#[derive(Debug, Default, Deserialize)]
struct ClientEnvelope {
    #[serde(default)]
    event: String,
    #[serde(default)]
    data: SendMessagePayload,
}

#[derive(Debug, Default, Deserialize)]
struct SendMessagePayload {
    #[serde(default)]
    message: Option<String>,
    /// Older clients send `text` instead of `message`.
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    user: Option<String>,
}

/// Outcome of one inbound frame.
enum Reply {
    /// Publish to every connected client via the event bus.
    Broadcast(ChannelEvent),
    /// Answer only the connection that sent the frame.
    Direct(String),
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| client_session(socket, state))
}

/// Per-connection task: moderate inbound frames, forward bus events out.
async fn client_session(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let mut events = state.store.events().subscribe();
    debug!("Realtime client connected");

    loop {
        tokio::select! {
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(raw))) => {
                    match handle_client_event(&state.store, raw.as_str()) {
                        Some(Reply::Broadcast(event)) => state.store.events().publish(event),
                        Some(Reply::Direct(frame)) => {
                            if sink.send(Message::Text(frame.into())).await.is_err() {
                                break;
                            }
                        }
                        None => {}
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Ping/pong is answered by axum; binary frames are ignored.
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(error = %err, "Realtime client error");
                    break;
                }
            },
            event = events.recv() => match event {
                Ok(event) => {
                    if sink.send(Message::Text(encode_event(&event).into())).await.is_err() {
                        break;
                    }
                }
                // Fire-and-forget: a lagging client just misses the dropped events.
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
        }
    }

    debug!("Realtime client disconnected");
}

/// Handle one inbound frame. Unknown events and unparseable frames are
/// ignored; `send_message` yields either a broadcast or a direct error
/// reply.
fn handle_client_event(store: &ModerationStore, raw: &str) -> Option<Reply> {
    let envelope: ClientEnvelope = serde_json::from_str(raw).unwrap_or_default();
    if envelope.event != "send_message" {
        return None;
    }

    let text = envelope
        .data
        .message
        .or(envelope.data.text)
        .unwrap_or_default();
    let user = match envelope.data.user {
        Some(user) if !user.is_empty() => user,
        _ => "anonymous".to_string(),
    };

    let result = match check_safety(&text) {
        Ok(result) => result,
        Err(err) => {
            // Only the sender learns about a checker failure.
            let frame = json!({
                "event": "message_response",
                "data": {
                    "user": user,
                    "text": text,
                    "flagged": false,
                    "categories": {},
                    "error": err.to_string(),
                },
            });
            return Some(Reply::Direct(frame.to_string()));
        }
    };

    store.record_message(&user, result.flagged);
    if result.flagged {
        store.record_flagged(&user, &text, result.categories.clone());
    }

    Some(Reply::Broadcast(ChannelEvent::MessageResponse(
        MessageResponse {
            user,
            text,
            flagged: result.flagged,
            categories: result.categories,
        },
    )))
}

/// Encode a bus event as an outbound envelope.
fn encode_event(event: &ChannelEvent) -> String {
    let envelope = match event {
        ChannelEvent::MessageResponse(msg) => json!({"event": "message_response", "data": msg}),
        ChannelEvent::FocusStatus(status) => json!({"event": "focus_status", "data": status}),
    };
    envelope.to_string()
}
