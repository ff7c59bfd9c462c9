//! WebSocket endpoints for transport-client connections.
//!
//! Flow per connection:
//! 1. Upgrade on `/debugger` or `/device`
//! 2. Issue a fresh `client_id` and send the `CONNECTION_ESTABLISHED`
//!    handshake before reading anything — clients queue until they see it
//! 3. Decode inbound envelopes, refresh the registry, publish to channel
//!    subscribers; malformed frames are logged and dropped
//! 4. Remove the registry entry when the socket ends

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tether_protocol::{codec, Envelope};
use tokio::sync::mpsc;

use crate::registry::ConnectedClient;
use crate::state::{AppState, Channel};

/// GET /debugger — debugging-frontend endpoint.
pub async fn debugger_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let channel = state.debugger.clone();
    let instance_id = state.instance_id.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, instance_id, channel))
}

/// GET /device — device transport endpoint.
pub async fn device_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let channel = state.device.clone();
    let instance_id = state.instance_id.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, instance_id, channel))
}

async fn handle_socket(socket: WebSocket, server_instance: Arc<String>, channel: Arc<Channel>) {
    let (mut ws_sink, mut ws_stream) = socket.split();

    // 1. Assign identity first: the handshake must precede any other frame.
    let client_id = uuid::Uuid::new_v4().to_string();
    let handshake = Envelope::handshake(server_instance.as_str(), &client_id);
    if send_envelope(&mut ws_sink, &handshake).await.is_err() {
        tracing::warn!(channel = channel.name, "client gone before handshake");
        return;
    }

    tracing::info!(
        channel = channel.name,
        client_id = %client_id,
        "client connected, identity assigned"
    );

    // 2. Writer task: forwards pushed envelopes to the client.
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Envelope>(64);
    channel.registry.register(ConnectedClient {
        client_id: client_id.clone(),
        instance_id: String::new(),
        connected_at: Utc::now(),
        last_seen: Utc::now(),
        sink: outbound_tx,
    });

    let writer = tokio::spawn(async move {
        while let Some(envelope) = outbound_rx.recv().await {
            if send_envelope(&mut ws_sink, &envelope).await.is_err() {
                break;
            }
        }
    });

    // 3. Reader loop: tolerant decode, registry refresh, publish.
    while let Some(Ok(msg)) = ws_stream.next().await {
        let decoded = match &msg {
            Message::Text(text) => codec::decode_text(text),
            Message::Binary(bytes) => codec::decode_binary(bytes),
            Message::Close(_) => break,
            // axum answers WS-level ping/pong itself.
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        match decoded {
            Ok(envelope) => {
                channel.registry.touch(&client_id, &envelope.instance_id);
                tracing::debug!(
                    channel = channel.name,
                    client_id = %client_id,
                    event_type = %envelope.event_type,
                    "event received"
                );
                channel.publish(envelope);
            }
            Err(err) => {
                tracing::warn!(
                    channel = channel.name,
                    client_id = %client_id,
                    error = %err,
                    "dropping malformed frame"
                );
            }
        }
    }

    // 4. Cleanup.
    writer.abort();
    channel.registry.remove(&client_id);
    tracing::info!(channel = channel.name, client_id = %client_id, "client disconnected");
}

async fn send_envelope(
    sink: &mut (impl SinkExt<Message> + Unpin),
    envelope: &Envelope,
) -> Result<(), ()> {
    let json = codec::encode(envelope).map_err(|_| ())?;
    sink.send(Message::Text(json)).await.map_err(|_| ())
}
