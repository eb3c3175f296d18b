//! Real-time event stream.
//!
//! One WebSocket per observed game, kept alive by a reconnecting state
//! machine. Every inbound frame is parsed, its cache invalidations applied,
//! and the event forwarded to the current [`EventHandler`].
//!
//! # Module Layout
//!
//! - [`transport`]: socket seam and the `tokio-tungstenite` connector
//! - [`backoff`]: reconnect delays
//! - [`connection`]: the `Connecting/Open/Backoff/Closed` loop
//! - [`dispatcher`]: event → invalidation table
//! - [`handler`]: handler trait and swappable slot
//! - [`manager`]: one-stream-per-game handles
//! - [`update_bus`]: broadcast of state changes and dispatched events

pub mod backoff;
pub mod connection;
pub mod dispatcher;
pub mod handler;
pub mod manager;
pub mod transport;
pub mod update_bus;

pub use backoff::BackoffPolicy;
pub use connection::ConnectionState;
pub use dispatcher::{DispatchOutcome, EventDispatcher, invalidations};
pub use handler::{EventHandler, HandlerSlot, NoopHandler};
pub use manager::{GameSync, SyncContext, SyncManager};
pub use transport::{Connector, Transport, WsConnector, ws_url};
pub use update_bus::{SyncUpdate, UpdateBus};
