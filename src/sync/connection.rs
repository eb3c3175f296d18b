//! Connection state machine for one game's event stream.
//!
//! ```text
//!            connect ok              stream ends / fails
//! Connecting ──────────► Open ─────────────────────────┐
//!     ▲                                                ▼
//!     └──────────── delay elapsed ──────────── Backoff{attempt, delay}
//!
//! shutdown, or attempts exhausted ──► Closed
//! ```
//!
//! Every `Open` after the first marks all cached views of the game stale,
//! since events may have been missed while the stream was down.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use url::Url;

use super::backoff::BackoffPolicy;
use super::dispatcher::EventDispatcher;
use super::transport::{Connector, Transport};
use super::update_bus::{SyncUpdate, UpdateBus};
use crate::cache::QueryCache;
use crate::domain::GameId;

/// Consecutive receive errors after which a stream is treated as dead.
const MAX_CONSECUTIVE_RECV_ERRORS: u32 = 3;

/// State of a game's event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Opening the socket.
    #[default]
    Connecting,
    /// Receiving frames.
    Open,
    /// Waiting before the next connect attempt.
    Backoff {
        /// Consecutive failed attempt number, starting at 1.
        attempt: u32,
        /// Wait before reconnecting.
        delay: Duration,
    },
    /// Stopped for good: shut down, reconnect disabled, or attempts
    /// exhausted.
    Closed,
}

impl ConnectionState {
    /// Returns `true` while frames are flowing.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

enum StreamEnd {
    Shutdown,
    Disconnected,
}

/// The reconnecting read loop behind a [`crate::sync::GameSync`].
pub(crate) struct ConnectionLoop {
    pub(crate) game_id: GameId,
    pub(crate) url: Url,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) dispatcher: EventDispatcher,
    pub(crate) cache: Arc<QueryCache>,
    pub(crate) bus: UpdateBus,
    pub(crate) policy: BackoffPolicy,
    pub(crate) state: watch::Sender<ConnectionState>,
}

impl ConnectionLoop {
    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
        self.bus.publish(SyncUpdate::Connection {
            game_id: self.game_id,
            state,
        });
    }

    /// Runs until `shutdown` fires (or its sender is dropped), or until the
    /// backoff policy gives up.
    pub(crate) async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        let game_id = self.game_id;
        let mut opened_before = false;
        let mut attempt: u32 = 0;

        loop {
            self.set_state(ConnectionState::Connecting);
            tracing::debug!(%game_id, url = %self.url, "connecting event stream");

            let connected = tokio::select! {
                result = self.connector.connect(&self.url) => result,
                _ = &mut shutdown => {
                    self.set_state(ConnectionState::Closed);
                    return;
                }
            };

            match connected {
                Ok(mut transport) => {
                    attempt = 0;
                    self.set_state(ConnectionState::Open);
                    tracing::info!(%game_id, "event stream connected");

                    if opened_before {
                        let flushed = self.cache.invalidate_game(game_id).await;
                        tracing::info!(%game_id, flushed, "reconnected, cached views marked stale");
                        self.bus.publish(SyncUpdate::Resynced { game_id, flushed });
                    }
                    opened_before = true;

                    match self.read(transport.as_mut(), &mut shutdown).await {
                        StreamEnd::Shutdown => {
                            if let Err(e) = transport.close().await {
                                tracing::debug!(%game_id, error = %e, "close handshake failed");
                            }
                            tracing::info!(%game_id, "event stream closed");
                            self.set_state(ConnectionState::Closed);
                            return;
                        }
                        StreamEnd::Disconnected => {
                            tracing::info!(%game_id, "event stream disconnected");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(%game_id, error = %e, "event stream connect failed");
                }
            }

            attempt = attempt.saturating_add(1);
            if !self.policy.allows(attempt) {
                tracing::warn!(%game_id, attempt, "reconnect disabled or attempts exhausted");
                self.set_state(ConnectionState::Closed);
                return;
            }
            let delay = self.policy.delay_for(attempt);
            tracing::info!(%game_id, attempt, delay_ms = delay.as_millis(), "reconnect scheduled");
            self.set_state(ConnectionState::Backoff { attempt, delay });

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                _ = &mut shutdown => {
                    self.set_state(ConnectionState::Closed);
                    return;
                }
            }
        }
    }

    /// Reads and dispatches frames one at a time until the stream ends.
    async fn read(
        &self,
        transport: &mut dyn Transport,
        shutdown: &mut oneshot::Receiver<()>,
    ) -> StreamEnd {
        let mut errors: u32 = 0;
        loop {
            tokio::select! {
                _ = &mut *shutdown => return StreamEnd::Shutdown,
                frame = transport.recv() => match frame {
                    Some(Ok(text)) => {
                        errors = 0;
                        self.dispatcher.dispatch(&text).await;
                    }
                    Some(Err(e)) => {
                        errors += 1;
                        tracing::warn!(game_id = %self.game_id, error = %e, errors, "event stream receive error");
                        if errors >= MAX_CONSECUTIVE_RECV_ERRORS {
                            return StreamEnd::Disconnected;
                        }
                    }
                    None => return StreamEnd::Disconnected,
                },
            }
        }
    }
}
