//! Event handler seam and its swappable slot.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::domain::{GameEvent, GameId};

/// Receives every dispatched event, after its invalidations were applied.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handles one event from the stream of `game_id`.
    async fn handle(&self, game_id: GameId, event: GameEvent);
}

/// A handler that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

#[async_trait]
impl EventHandler for NoopHandler {
    async fn handle(&self, _game_id: GameId, _event: GameEvent) {}
}

/// Always-current reference to the caller's handler.
///
/// The connection loop reads the slot for every frame, so replacing the
/// handler takes effect on the next frame without touching the socket.
#[derive(Clone)]
pub struct HandlerSlot {
    inner: Arc<RwLock<Arc<dyn EventHandler>>>,
}

impl std::fmt::Debug for HandlerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerSlot").finish_non_exhaustive()
    }
}

impl Default for HandlerSlot {
    fn default() -> Self {
        Self::new(Arc::new(NoopHandler))
    }
}

impl HandlerSlot {
    /// Creates a slot holding `handler`.
    #[must_use]
    pub fn new(handler: Arc<dyn EventHandler>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(handler)),
        }
    }

    /// Replaces the handler.
    pub fn set(&self, handler: Arc<dyn EventHandler>) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = handler;
    }

    /// Returns the current handler.
    #[must_use]
    pub fn current(&self) -> Arc<dyn EventHandler> {
        let guard = self
            .inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(&*guard)
    }
}
