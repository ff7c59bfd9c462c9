//! `tether-client` — reliable event transport over a single WebSocket.
//!
//! Producers (console hooks, HTTP/WebSocket interceptors, version checkers)
//! hand structured events to this crate via `send(type, payload)`; the
//! transport guarantees they reach the companion dev server in call order,
//! never before the server has assigned a session identity, and across
//! disconnects within the reconnect budget.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  Your producer (console hook, HTTP interceptor, ...)       │
//! │                                                            │
//! │   let client = ClientBuilder::new()                        │
//! │       .host("localhost")                                   │
//! │       .port(20024)                                         │
//! │       .build(MyHandler)?;                                  │
//! │   client.connect();                                        │
//! │                                                            │
//! │   let sender = client.sender();                            │
//! │   sender.send("CONSOLE_LOG", payload).await;               │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Connection flow (hard-coded by the transport)
//!
//! 1. Dial `ws(s)://host:port`; publish `CONNECTING` on the status channel
//! 2. Wait for the server's `CONNECTION_ESTABLISHED` handshake carrying the
//!    session `client_id`
//! 3. Drain every event queued while disconnected or pre-handshake, in
//!    insertion order, rewritten with the fresh `client_id`
//! 4. Invoke [`EventHandler::on_connection_established`] so the caller can
//!    emit session-scoped bootstrap events
//! 5. On disconnect: clear the identity, retry at a fixed interval up to the
//!    attempt budget, then park in terminal `FAILED`
//!
//! Events submitted mid-drain wait for the drain to finish; wire order always
//! equals call order.

pub mod builder;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod reconnect;
pub mod status;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use builder::ClientBuilder;
pub use client::{EventClient, EventSender};
pub use config::{host_from_url, ClientConfig};
pub use error::ClientError;
pub use handler::{EventHandler, NoopHandler};
pub use reconnect::ReconnectPolicy;
pub use status::ConnectionStatus;

// Re-export protocol types so producers never need tether-protocol directly.
pub use tether_protocol::{event_types, Envelope, DEFAULT_PORT};
