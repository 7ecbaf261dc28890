//! WebSocket push of `focusData` events.
//!
//! A new subscriber gets the current roster straight away, then every event
//! the ticker publishes. Subscribers that fall behind skip the missed events.
//! Anything the client sends is ignored apart from close frames.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use focusroom_core::Event;

use crate::state::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Text frame carrying the JSON form of `event`.
pub fn encode_event(event: &Event) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            tracing::warn!(error = %e, event = event.name(), "Failed to encode event");
            None
        }
    }
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    // Subscribe before reading the snapshot so no tick falls in between.
    let mut rx = state.subscribe();
    let (mut sender, mut receiver) = socket.split();
    tracing::info!(subscribers = state.subscriber_count(), "A user connected");

    if let Some(msg) = encode_event(&Event::FocusData(state.snapshot())) {
        if sender.send(msg).await.is_err() {
            tracing::info!("A user disconnected");
            return;
        }
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let Some(msg) = encode_event(&event) else {
                        continue;
                    };
                    if sender.send(msg).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Subscriber lagged, skipping events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    tracing::info!("A user disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use focusroom_core::Roster;

    #[test]
    fn encodes_focus_data_as_text_frame() {
        let roster = Roster::seeded(&["Alice", "Bob"], &[75, 85], Utc::now());
        let msg = encode_event(&Event::FocusData(roster.snapshot())).unwrap();
        let Message::Text(text) = msg else {
            panic!("expected a text frame");
        };
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["event"], "focusData");
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
    }
}
