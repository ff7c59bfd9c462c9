//! Integration tests for the server-side handshake model: boots the real
//! router on an ephemeral port and connects raw WebSocket clients.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tether_protocol::{codec, event_types, Envelope};
use tether_server::{router, AppState};
use tokio_tungstenite::tungstenite::Message;

type WsClient = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn start_server() -> (SocketAddr, AppState) {
    let state = AppState::new();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn connect(addr: SocketAddr, path: &str) -> WsClient {
    let (ws, _resp) = tokio_tungstenite::connect_async(format!("ws://{addr}{path}"))
        .await
        .expect("connect failed");
    ws
}

async fn read_envelope(ws: &mut WsClient) -> Envelope {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let msg = tokio::time::timeout_at(deadline, ws.next())
            .await
            .expect("timeout waiting for frame")
            .expect("stream ended")
            .expect("stream error");
        match msg {
            Message::Text(text) => return codec::decode_text(&text).unwrap(),
            Message::Binary(bytes) => return codec::decode_binary(&bytes).unwrap(),
            _ => continue,
        }
    }
}

async fn wait_until(mut check: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !check() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition never became true"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn handshake_is_the_first_frame() {
    let (addr, state) = start_server().await;
    let mut ws = connect(addr, "/device").await;

    let hs = read_envelope(&mut ws).await;
    assert_eq!(hs.event_type, event_types::CONNECTION_ESTABLISHED);
    assert!(!hs.client_id.is_empty());
    assert_eq!(hs.instance_id, *state.instance_id);

    let clients = state.device.registry.list();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].client_id, hs.client_id);
}

#[tokio::test]
async fn inbound_events_reach_channel_subscribers() {
    let (addr, state) = start_server().await;
    let mut inbound = state.device.subscribe();

    let mut ws = connect(addr, "/device").await;
    let hs = read_envelope(&mut ws).await;

    let event = Envelope::new(
        "inst-x",
        &hs.client_id,
        event_types::CONSOLE_LOG,
        serde_json::json!({ "args": ["hello"] }),
    );
    ws.send(Message::Text(codec::encode(&event).unwrap()))
        .await
        .unwrap();

    let received = tokio::time::timeout(Duration::from_secs(5), inbound.recv())
        .await
        .expect("timeout")
        .unwrap();
    assert_eq!(received.event_type, event_types::CONSOLE_LOG);
    assert_eq!(received.client_id, hs.client_id);

    // The registry learns the client's instance id from its first envelope.
    wait_until(|| {
        state
            .device
            .registry
            .list()
            .first()
            .is_some_and(|c| c.instance_id == "inst-x")
    })
    .await;
}

#[tokio::test]
async fn malformed_frames_are_dropped_not_fatal() {
    let (addr, state) = start_server().await;
    let mut inbound = state.device.subscribe();

    let mut ws = connect(addr, "/device").await;
    let hs = read_envelope(&mut ws).await;

    ws.send(Message::Text("not json".into())).await.unwrap();
    ws.send(Message::Binary(vec![0xff, 0xfe])).await.unwrap();
    ws.send(Message::Text(r#"{"no_type": true}"#.into()))
        .await
        .unwrap();

    // The connection survives and the next valid event still arrives.
    let event = Envelope::new("inst-x", &hs.client_id, "OK", serde_json::Value::Null);
    ws.send(Message::Text(codec::encode(&event).unwrap()))
        .await
        .unwrap();

    let received = tokio::time::timeout(Duration::from_secs(5), inbound.recv())
        .await
        .expect("timeout")
        .unwrap();
    assert_eq!(received.event_type, "OK");
    assert_eq!(state.device.registry.len(), 1);
}

#[tokio::test]
async fn paths_are_isolated_channels() {
    let (addr, state) = start_server().await;
    let mut debugger_inbound = state.debugger.subscribe();

    let mut device_ws = connect(addr, "/device").await;
    let device_hs = read_envelope(&mut device_ws).await;
    let mut debugger_ws = connect(addr, "/debugger").await;
    let debugger_hs = read_envelope(&mut debugger_ws).await;

    assert_ne!(device_hs.client_id, debugger_hs.client_id);
    assert_eq!(state.device.registry.len(), 1);
    assert_eq!(state.debugger.registry.len(), 1);

    // A device event must not leak onto the debugger channel.
    let event = Envelope::new("inst-x", &device_hs.client_id, "DEVICE_ONLY", serde_json::Value::Null);
    device_ws
        .send(Message::Text(codec::encode(&event).unwrap()))
        .await
        .unwrap();

    let leaked = tokio::time::timeout(Duration::from_millis(200), debugger_inbound.recv()).await;
    assert!(leaked.is_err(), "device event leaked to debugger channel");
}

#[tokio::test]
async fn server_can_push_to_a_client() {
    let (addr, state) = start_server().await;
    let mut ws = connect(addr, "/debugger").await;
    let hs = read_envelope(&mut ws).await;

    let sink = state.debugger.registry.get_sink(&hs.client_id).unwrap();
    sink.send(Envelope::new(
        state.instance_id.as_str(),
        &hs.client_id,
        "CLIENT_WEBSOCKET_EVENT",
        serde_json::json!("payload"),
    ))
    .await
    .unwrap();

    let pushed = read_envelope(&mut ws).await;
    assert_eq!(pushed.event_type, "CLIENT_WEBSOCKET_EVENT");
    assert_eq!(pushed.client_id, hs.client_id);
}

#[tokio::test]
async fn disconnect_removes_the_registry_entry() {
    let (addr, state) = start_server().await;
    let mut ws = connect(addr, "/device").await;
    let _hs = read_envelope(&mut ws).await;
    assert_eq!(state.device.registry.len(), 1);

    ws.close(None).await.unwrap();
    wait_until(|| state.device.registry.is_empty()).await;
}
