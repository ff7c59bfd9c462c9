//! Core event client — owns the WebSocket lifecycle, the handshake-gated
//! pending queue, and the fixed-interval reconnect loop.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tether_protocol::{codec, Envelope};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::dispatch::Dispatcher;
use crate::handler::EventHandler;
use crate::status::{ConnectionStatus, StatusChannel};

/// State shared between the public handles and the connection task.
pub(crate) struct Shared {
    instance_id: String,
    status: StatusChannel,
    /// Server-issued session identity; `None` until a handshake assigns it,
    /// cleared whenever the socket closes.
    client_id: RwLock<Option<String>>,
    /// Hand-off point to the current session's writer task; `None` while
    /// disconnected.
    outbound: RwLock<Option<mpsc::Sender<Envelope>>>,
    dispatcher: Dispatcher,
}

impl Shared {
    fn new(instance_id: String, max_pending_events: usize) -> Self {
        Self {
            instance_id,
            status: StatusChannel::new(),
            client_id: RwLock::new(None),
            outbound: RwLock::new(None),
            dispatcher: Dispatcher::new(max_pending_events),
        }
    }

    /// Dispatch one event: transmit immediately when a session identity is
    /// known and the socket is up, otherwise append to the pending queue.
    ///
    /// Holds the dispatcher lock for the whole decision + hand-off, so an
    /// event submitted while a drain is in progress waits for the queue to
    /// empty and can never overtake queued events or carry a stale identity.
    async fn send(&self, event_type: String, payload: serde_json::Value) {
        let mut queue = self.dispatcher.lock().await;

        let client_id = self.client_id.read().clone();
        let envelope = Envelope::new(
            &self.instance_id,
            client_id.clone().unwrap_or_default(),
            event_type,
            payload,
        );

        let connected = self.status.get() == ConnectionStatus::Connected;
        if client_id.is_none() || !connected {
            queue.push(envelope);
            return;
        }

        let sender = self.outbound.read().clone();
        match sender {
            Some(tx) => {
                if let Err(err) = tx.send(envelope).await {
                    // Session died mid-send; keep the event for the next drain.
                    queue.push(err.0);
                }
            }
            None => queue.push(envelope),
        }
    }

    /// Handshake coordination: store the server-issued identity and drain
    /// the pending queue exactly once, in insertion order, rewriting each
    /// envelope with the fresh `client_id`.
    ///
    /// The identity is assigned while the dispatcher lock is held, so no
    /// concurrent `send()` can observe the new identity before the queue is
    /// empty.  An envelope leaves the queue only after successful hand-off.
    async fn assign_identity_and_drain(&self, client_id: String) {
        let mut queue = self.dispatcher.lock().await;
        *self.client_id.write() = Some(client_id.clone());

        let Some(tx) = self.outbound.read().clone() else {
            return;
        };

        tracing::debug!(
            client_id = %client_id,
            pending = queue.len(),
            "draining pending events"
        );

        while let Some(mut envelope) = queue.pop() {
            envelope.client_id = client_id.clone();
            if let Err(err) = tx.send(envelope).await {
                queue.push_front(err.0);
                break;
            }
        }
    }

    fn set_outbound(&self, tx: mpsc::Sender<Envelope>) {
        *self.outbound.write() = Some(tx);
    }

    /// A closed socket invalidates the session: drop the identity and the
    /// writer hand-off.
    fn end_session(&self) {
        *self.outbound.write() = None;
        *self.client_id.write() = None;
    }
}

/// Cloneable sending handle for producers.
///
/// Producers only ever see `send(type, payload)`; queueing, handshake, and
/// reconnection stay internal.  `send` never fails from the producer's point
/// of view — transport trouble surfaces on the status channel instead.
#[derive(Clone)]
pub struct EventSender {
    shared: Arc<Shared>,
}

impl EventSender {
    /// Submit one event for delivery.
    pub async fn send(&self, event_type: impl Into<String>, payload: impl serde::Serialize) {
        let event_type = event_type.into();
        let payload = match serde_json::to_value(payload) {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!(
                    event_type = %event_type,
                    error = %err,
                    "dropping event with unserializable payload"
                );
                return;
            }
        };
        self.shared.send(event_type, payload).await;
    }

    /// Identifier stable for the lifetime of the owning client.
    pub fn instance_id(&self) -> &str {
        &self.shared.instance_id
    }
}

/// A fully-configured transport client.
///
/// Create via [`ClientBuilder`](crate::builder::ClientBuilder), then call
/// [`connect`](Self::connect) to start the connection task.
pub struct EventClient {
    shared: Arc<Shared>,
    config: ClientConfig,
    handler: Arc<dyn EventHandler>,
    shutdown: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl EventClient {
    pub(crate) fn new(config: ClientConfig, handler: Arc<dyn EventHandler>) -> Self {
        let instance_id = uuid::Uuid::new_v4().to_string();
        Self {
            shared: Arc::new(Shared::new(instance_id, config.max_pending_events)),
            config,
            handler,
            shutdown: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    /// Start (or restart) the connection task.
    ///
    /// Resets the reconnect-attempt counter; a previous task, including any
    /// pending reconnect timer, is superseded.  No-op after
    /// [`shutdown`](Self::shutdown).
    pub fn connect(&self) {
        if self.shutdown.is_cancelled() {
            tracing::warn!("connect() after shutdown ignored");
            return;
        }

        let mut task = self.task.lock();
        if let Some(previous) = task.take() {
            previous.abort();
        }

        let shared = self.shared.clone();
        let config = self.config.clone();
        let handler = self.handler.clone();
        let cancel = self.shutdown.clone();
        *task = Some(tokio::spawn(async move {
            run(shared, config, handler, cancel).await;
        }));
    }

    /// Recover from terminal `FAILED` by dialing again with fresh counters.
    pub fn reconnect(&self) {
        self.connect();
    }

    /// Submit one event for delivery. See [`EventSender::send`].
    pub async fn send(&self, event_type: impl Into<String>, payload: impl serde::Serialize) {
        self.sender().send(event_type, payload).await;
    }

    /// A cloneable handle for producers.
    pub fn sender(&self) -> EventSender {
        EventSender {
            shared: self.shared.clone(),
        }
    }

    /// The currently active connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.shared.status.get()
    }

    /// Subscribe to status transitions.
    pub fn subscribe_status(&self) -> tokio::sync::broadcast::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    /// The server-issued session identity, if a handshake has completed.
    pub fn client_id(&self) -> Option<String> {
        self.shared.client_id.read().clone()
    }

    /// Identifier stable for the lifetime of this client.
    pub fn instance_id(&self) -> &str {
        &self.shared.instance_id
    }

    /// Close the socket and stop reconnecting. Terminal for this instance:
    /// the status stays whatever it was, and no further automatic attempts
    /// occur.
    pub fn shutdown(&self) {
        tracing::info!(instance_id = %self.shared.instance_id, "shutdown requested");
        self.shutdown.cancel();
        self.shared.end_session();
    }
}

impl Drop for EventClient {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// How one connection session ended.
enum SessionEnd {
    /// Peer closed the socket or the stream finished.
    Closed,
    /// Stream-level error while the socket was open.
    StreamError,
}

/// Connection-manager loop: dial, run the session, then either reschedule
/// at the fixed interval or park in terminal `FAILED`.
///
/// Status publications: `CONNECTING` once for the initial dial, `CONNECTED`
/// on open, `DISCONNECTED`/`FAILED` when an open socket closes/errors, and
/// one `RECONNECTING` per scheduled retry (the retry dial itself happens
/// under `RECONNECTING`).
async fn run(
    shared: Arc<Shared>,
    config: ClientConfig,
    handler: Arc<dyn EventHandler>,
    cancel: CancellationToken,
) {
    let url = config.url();
    let mut attempt: u32 = 0;

    shared.status.set(ConnectionStatus::Connecting);

    loop {
        if cancel.is_cancelled() {
            return;
        }

        let session = tokio::select! {
            s = run_session(&shared, &url, &handler, &mut attempt) => s,
            _ = cancel.cancelled() => {
                tracing::info!(url = %url, "connection task stopped");
                shared.end_session();
                return;
            }
        };

        shared.end_session();

        match session {
            Ok(SessionEnd::Closed) => {
                shared.status.set(ConnectionStatus::Disconnected);
            }
            Ok(SessionEnd::StreamError) => {
                shared.status.set(ConnectionStatus::Failed);
            }
            Err(err) => {
                // Dial failure: the socket never opened.
                tracing::warn!(url = %url, attempt, error = %err, "connection attempt failed");
            }
        }

        if config.reconnect.should_give_up(attempt) {
            tracing::error!(url = %url, attempts = attempt, "reconnect budget exhausted");
            shared.status.set(ConnectionStatus::Failed);
            return;
        }

        shared.status.set(ConnectionStatus::Reconnecting);
        tokio::select! {
            _ = tokio::time::sleep(config.reconnect.interval) => {}
            _ = cancel.cancelled() => return,
        }
        attempt += 1;
    }
}

/// Single connection lifecycle: dial → writer task → inbound loop.
///
/// Returns `Err` when the dial itself fails, `Ok(SessionEnd)` once an open
/// socket ends.
async fn run_session(
    shared: &Arc<Shared>,
    url: &str,
    handler: &Arc<dyn EventHandler>,
    attempt: &mut u32,
) -> Result<SessionEnd, tokio_tungstenite::tungstenite::Error> {
    tracing::info!(url = %url, "connecting to dev server");
    let (ws, _response) = tokio_tungstenite::connect_async(url).await?;

    *attempt = 0;
    shared.status.set(ConnectionStatus::Connected);

    let (mut sink, mut stream) = ws.split();

    // Writer task: serializes outbound envelopes onto the socket. Exits when
    // every sender handle is gone or the sink fails.
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Envelope>(64);
    shared.set_outbound(outbound_tx);
    let writer = tokio::spawn(async move {
        while let Some(envelope) = outbound_rx.recv().await {
            let json = match codec::encode(&envelope) {
                Ok(j) => j,
                Err(err) => {
                    tracing::error!(error = %err, "failed to serialize outbound envelope");
                    continue;
                }
            };
            if sink.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Inbound loop: decode, route handshakes to the coordinator, hand
    // everything else to the handler. Malformed frames are dropped.
    let end = loop {
        match stream.next().await {
            Some(Ok(message)) => {
                let decoded = match &message {
                    Message::Text(text) => codec::decode_text(text),
                    Message::Binary(bytes) => codec::decode_binary(bytes),
                    Message::Close(_) => break SessionEnd::Closed,
                    // WS-level ping/pong is handled by tungstenite.
                    _ => continue,
                };

                match decoded {
                    Ok(envelope) if envelope.is_handshake() => {
                        if envelope.client_id.is_empty() {
                            tracing::warn!("handshake without client_id, ignoring");
                            continue;
                        }
                        tracing::info!(client_id = %envelope.client_id, "session identity assigned");
                        shared
                            .assign_identity_and_drain(envelope.client_id.clone())
                            .await;
                        let sender = EventSender {
                            shared: shared.clone(),
                        };
                        handler.on_connection_established(&sender, &envelope).await;
                    }
                    Ok(envelope) => handler.on_event(envelope).await,
                    Err(err) => {
                        tracing::warn!(error = %err, "dropping malformed frame");
                    }
                }
            }
            Some(Err(err)) => {
                tracing::warn!(error = %err, "websocket stream error");
                break SessionEnd::StreamError;
            }
            None => break SessionEnd::Closed,
        }
    };

    writer.abort();
    Ok(end)
}
