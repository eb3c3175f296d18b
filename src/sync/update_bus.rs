//! Broadcast channel for sync updates.
//!
//! [`UpdateBus`] wraps a [`tokio::sync::broadcast`] channel. The connection
//! loop publishes state changes and resyncs through it, and the
//! notification coordinator publishes every dispatched event together with
//! the UI effects it produced. Views subscribe to render them.

use tokio::sync::broadcast;

use super::connection::ConnectionState;
use crate::domain::{GameEvent, GameId};
use crate::notify::UiEffect;

/// One update published on the [`UpdateBus`].
#[derive(Debug, Clone, PartialEq)]
pub enum SyncUpdate {
    /// The event stream of a game changed state.
    Connection {
        /// Game.
        game_id: GameId,
        /// New state.
        state: ConnectionState,
    },
    /// The stream reopened and every cached view of the game was marked
    /// stale.
    Resynced {
        /// Game.
        game_id: GameId,
        /// Number of cache entries flushed.
        flushed: usize,
    },
    /// A pushed event was dispatched.
    Dispatched {
        /// Game the stream belongs to.
        game_id: GameId,
        /// The event.
        event: GameEvent,
        /// Effects derived from it, in order.
        effects: Vec<UiEffect>,
    },
}

impl SyncUpdate {
    /// Returns the game this update belongs to.
    #[must_use]
    pub const fn game_id(&self) -> GameId {
        match self {
            Self::Connection { game_id, .. }
            | Self::Resynced { game_id, .. }
            | Self::Dispatched { game_id, .. } => *game_id,
        }
    }
}

/// Broadcast bus for [`SyncUpdate`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity
/// (default 1024). When the ring buffer is full, the oldest updates are
/// dropped for lagging receivers.
#[derive(Debug, Clone)]
pub struct UpdateBus {
    sender: broadcast::Sender<SyncUpdate>,
}

impl Default for UpdateBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl UpdateBus {
    /// Creates a new `UpdateBus` with the given channel capacity.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an update to all subscribers.
    ///
    /// Returns the number of receivers that received the update.
    /// If there are no active receivers, the update is silently dropped.
    pub fn publish(&self, update: SyncUpdate) -> usize {
        self.sender.send(update).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future updates.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncUpdate> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
