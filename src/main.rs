//! polycomp-sync entry point.
//!
//! Follows one game's event stream and renders the resulting UI effects as
//! log lines. `GAME_ID` selects the game; everything else comes from
//! [`ClientConfig::from_env`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use polycomp_sync::cache::{QueryCache, QueryKind};
use polycomp_sync::config::ClientConfig;
use polycomp_sync::domain::{GameEvent, GameId, GameSession};
use polycomp_sync::notify::{
    CachedSnapshot, CoordinatorHandler, LogAudioSink, NotificationCoordinator, SessionClock,
    Severity, UiEffect,
};
use polycomp_sync::rest::ApiClient;
use polycomp_sync::service::GameActions;
use polycomp_sync::session::SessionContext;
use polycomp_sync::sync::{SyncContext, SyncManager, SyncUpdate, UpdateBus};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration and session
    let config = ClientConfig::from_env()?;
    let game_id: GameId = std::env::var("GAME_ID")
        .context("GAME_ID must be set")?
        .parse()
        .context("GAME_ID is not a valid game id")?;
    tracing::info!(api = %config.api_base_url, %game_id, "starting polycomp-sync");

    let session = Arc::new(match &config.session_file {
        Some(path) => SessionContext::load(path)?,
        None => SessionContext::new(),
    });
    session.set_on_unauthorized(Box::new(|| {
        tracing::warn!("session expired, log in again");
    }));
    if !session.is_authenticated() {
        tracing::warn!("no stored session; REST calls will be anonymous");
    }

    // Build client layer
    let api = Arc::new(ApiClient::new(&config, Arc::clone(&session))?);
    let cache = Arc::new(QueryCache::new());
    let bus = UpdateBus::new(config.event_bus_capacity);
    let actions = GameActions::new(Arc::clone(&api), Arc::clone(&cache));

    let game = match actions.view::<GameSession>(QueryKind::Game, game_id).await {
        Ok(game) => Some(game),
        Err(e) => {
            tracing::warn!(error = %e, "{}", e.user_message());
            None
        }
    };
    let clock = SessionClock::new(game.as_ref().and_then(|g| g.created_at));
    if let Some(game) = &game {
        tracing::info!(name = %game.name, status = %game.status, "game loaded");
    }
    report_bank_balance(&actions, game_id, config.initial_bank_balance).await;

    // Wire the coordinator into the event stream
    let coordinator = NotificationCoordinator::new(session.user().map(|u| u.id));
    let handler = Arc::new(CoordinatorHandler::new(
        coordinator,
        Arc::new(CachedSnapshot::new(Arc::clone(&cache), Some(Arc::clone(&api)))),
        Arc::clone(&cache),
        bus.clone(),
        Arc::new(LogAudioSink),
    ));
    let mut manager = SyncManager::new(SyncContext::from_config(&config, Arc::clone(&cache), bus.clone()));
    manager.set_handler(handler);

    let mut updates = bus.subscribe();
    manager.observe(game_id).await?;

    let mut tick = tokio::time::interval(Duration::from_secs(1));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "ctrl-c handler failed");
                }
                break;
            }
            _ = tick.tick() => {
                tracing::trace!(elapsed = %clock.display(), "session clock");
            }
            update = updates.recv() => match update {
                Ok(update) => {
                    let ledger_changed = matches!(
                        &update,
                        SyncUpdate::Dispatched { event: GameEvent::TransactionCreated(_), .. }
                    );
                    render(&update);
                    if ledger_changed {
                        report_bank_balance(&actions, game_id, config.initial_bank_balance).await;
                    }
                }
                Err(RecvError::Lagged(n)) => tracing::warn!(lagged = n, "update bus lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    tracing::info!("shutting down");
    manager.close().await;
    Ok(())
}

async fn report_bank_balance(actions: &GameActions, game_id: GameId, initial: i64) {
    match actions.bank_balance(game_id, initial).await {
        Ok(balance) => tracing::info!(%game_id, balance, "bank balance"),
        Err(e) => tracing::debug!(%game_id, error = %e, "bank balance unavailable"),
    }
}

fn render(update: &SyncUpdate) {
    match update {
        SyncUpdate::Connection { game_id, state } => {
            tracing::info!(%game_id, ?state, "connection");
        }
        SyncUpdate::Resynced { game_id, flushed } => {
            tracing::info!(%game_id, flushed, "resynced");
        }
        SyncUpdate::Dispatched { event, effects, .. } => {
            tracing::debug!(event_type = event.event_type(), "event");
            for effect in effects {
                match effect {
                    UiEffect::Toast { message, severity } => match severity {
                        Severity::Warning | Severity::Error => tracing::warn!("{message}"),
                        Severity::Info | Severity::Success => tracing::info!("{message}"),
                    },
                    UiEffect::ShowAuction { auction } => {
                        tracing::info!(bid = auction.current_bid, "auction open");
                    }
                    UiEffect::ShowIncomingTrade { trade } => {
                        tracing::info!(trade_id = %trade.id, "incoming trade offer");
                    }
                    other => tracing::debug!(?other, "effect"),
                }
            }
        }
    }
}
