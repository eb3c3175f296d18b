//! Per-game stream handles.
//!
//! A [`GameSync`] owns the background task that keeps one game's event
//! stream alive. [`SyncManager`] guarantees at most one such task at a time:
//! observing the same game again keeps the socket, observing another game
//! closes the old socket before the new one is opened.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use url::Url;

use super::backoff::BackoffPolicy;
use super::connection::{ConnectionLoop, ConnectionState};
use super::dispatcher::EventDispatcher;
use super::handler::{EventHandler, HandlerSlot};
use super::transport::{Connector, WsConnector, ws_url};
use super::update_bus::UpdateBus;
use crate::cache::QueryCache;
use crate::config::ClientConfig;
use crate::domain::GameId;
use crate::error::ClientError;

/// How long [`GameSync::close`] waits for the loop before aborting it.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Everything a stream task needs besides its game id.
#[derive(Clone)]
pub struct SyncContext {
    /// REST base URL; the stream URL is derived from it.
    pub api_base_url: Url,
    /// Opens sockets.
    pub connector: Arc<dyn Connector>,
    /// Cache the dispatcher invalidates.
    pub cache: Arc<QueryCache>,
    /// Bus for connection state and resync updates.
    pub bus: UpdateBus,
    /// Reconnect policy.
    pub policy: BackoffPolicy,
    /// Grace period for a clean close.
    pub shutdown_timeout: Duration,
}

impl std::fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncContext")
            .field("api_base_url", &self.api_base_url.as_str())
            .field("policy", &self.policy)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish_non_exhaustive()
    }
}

impl SyncContext {
    /// Builds a context from configuration with the WebSocket connector.
    #[must_use]
    pub fn from_config(config: &ClientConfig, cache: Arc<QueryCache>, bus: UpdateBus) -> Self {
        Self {
            api_base_url: config.api_base_url.clone(),
            connector: Arc::new(WsConnector),
            cache,
            bus,
            policy: config.backoff.clone(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Replaces the connector.
    #[must_use]
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }
}

/// Handle to one game's live event stream.
///
/// Dropping the handle aborts the task; [`GameSync::close`] closes the
/// socket cleanly first.
pub struct GameSync {
    game_id: GameId,
    handler: HandlerSlot,
    state: watch::Receiver<ConnectionState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl std::fmt::Debug for GameSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSync")
            .field("game_id", &self.game_id)
            .field("state", &self.state())
            .field("running", &self.is_running())
            .finish()
    }
}

impl GameSync {
    /// Spawns the stream task for `game_id`.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidScheme`] if the API base URL has no
    /// WebSocket counterpart.
    pub fn start(game_id: GameId, ctx: &SyncContext, handler: HandlerSlot) -> Result<Self, ClientError> {
        let url = ws_url(&ctx.api_base_url, game_id)?;
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let worker = ConnectionLoop {
            game_id,
            url,
            connector: Arc::clone(&ctx.connector),
            dispatcher: EventDispatcher::new(game_id, Arc::clone(&ctx.cache), handler.clone()),
            cache: Arc::clone(&ctx.cache),
            bus: ctx.bus.clone(),
            policy: ctx.policy.clone(),
            state: state_tx,
        };
        let task = tokio::spawn(worker.run(shutdown_rx));
        tracing::debug!(%game_id, "game sync started");

        Ok(Self {
            game_id,
            handler,
            state: state_rx,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
            shutdown_timeout: ctx.shutdown_timeout,
        })
    }

    /// Game this handle observes.
    #[must_use]
    pub const fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch receiver for connection state changes.
    #[must_use]
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Returns `true` while the background task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Replaces the event handler without touching the socket.
    pub fn set_handler(&self, handler: Arc<dyn EventHandler>) {
        self.handler.set(handler);
    }

    /// Closes the socket and stops the task.
    ///
    /// Waits up to the shutdown timeout for a clean close, then aborts.
    pub async fn close(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    tracing::warn!(game_id = %self.game_id, "sync task terminated with join error: {join_err}");
                }
                Err(_) => {
                    tracing::warn!(game_id = %self.game_id, "sync task did not exit within timeout; aborting");
                    task.abort();
                    if let Err(join_err) = task.await {
                        tracing::debug!(game_id = %self.game_id, "sync task aborted: {join_err}");
                    }
                }
            }
        }
    }
}

impl Drop for GameSync {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Keeps at most one game stream open.
#[derive(Debug)]
pub struct SyncManager {
    ctx: SyncContext,
    handler: HandlerSlot,
    active: Option<GameSync>,
}

impl SyncManager {
    /// Creates a manager with no open stream.
    #[must_use]
    pub fn new(ctx: SyncContext) -> Self {
        Self {
            ctx,
            handler: HandlerSlot::default(),
            active: None,
        }
    }

    /// Replaces the event handler of current and future streams. Never
    /// reconnects.
    pub fn set_handler(&self, handler: Arc<dyn EventHandler>) {
        self.handler.set(handler);
    }

    /// Ensures the stream for `game_id` is open.
    ///
    /// The same game keeps its socket. Another game closes the current
    /// socket before opening the new one. A stream whose task has stopped
    /// (e.g. attempts exhausted) is restarted.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidScheme`] if the stream URL cannot be
    /// derived from the API base URL.
    pub async fn observe(&mut self, game_id: GameId) -> Result<&GameSync, ClientError> {
        let keep = self
            .active
            .as_ref()
            .is_some_and(|s| s.game_id() == game_id && s.is_running());
        if !keep {
            if let Some(mut previous) = self.active.take() {
                tracing::info!(from = %previous.game_id(), to = %game_id, "switching game stream");
                previous.close().await;
            }
            self.active = Some(GameSync::start(game_id, &self.ctx, self.handler.clone())?);
        }
        self.active
            .as_ref()
            .ok_or_else(|| ClientError::Internal("game stream missing after start".to_string()))
    }

    /// Currently observed stream, if any.
    #[must_use]
    pub const fn active(&self) -> Option<&GameSync> {
        self.active.as_ref()
    }

    /// Closes the current stream, if any.
    pub async fn close(&mut self) {
        if let Some(mut sync) = self.active.take() {
            sync.close().await;
        }
    }
}
