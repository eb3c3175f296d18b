//! Turn and notification coordinator.
//!
//! [`NotificationCoordinator`] is a synchronous state machine: it folds each
//! dispatched [`GameEvent`] into its own view state (displayed auction,
//! displayed trade, results-viewed flag, last cash transaction) and returns
//! the [`UiEffect`]s the view should perform. It never touches the network
//! or the cache itself.
//!
//! [`CoordinatorHandler`] plugs it into the event stream. It runs on the
//! connection's task, so one event's invalidations and state update are
//! applied before the next frame is read.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::effects::{AudioCue, AudioSink, UiEffect, play_cue};
use crate::cache::{CacheKey, QueryCache, QueryKind};
use crate::domain::board::space_label;
use crate::domain::{
    Auction, AuctionStatus, GameEvent, GameId, GameStatus, Participant, ParticipantId, Trade,
    TradeId, TradeStatus, TransactionId, UserId,
};
use crate::rest::ApiClient;
use crate::sync::{EventHandler, SyncUpdate, UpdateBus};

const FALLBACK_NAME: &str = "Jugador";

/// Current participants of a game, as the view last saw them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameSnapshot {
    /// Participants with names and balances.
    pub participants: Vec<Participant>,
}

impl GameSnapshot {
    /// Finds a participant by seat id.
    #[must_use]
    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Finds a participant by user id.
    #[must_use]
    pub fn participant_of_user(&self, user_id: UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    fn name_of_user(&self, user_id: UserId) -> &str {
        self.participant_of_user(user_id)
            .map_or(FALLBACK_NAME, Participant::display_name)
    }
}

/// View state driven by the event stream.
#[derive(Debug, Clone, Default)]
pub struct NotificationCoordinator {
    local_user_id: Option<UserId>,
    displayed_auction: Option<Auction>,
    displayed_trade: Option<TradeId>,
    results_viewed: bool,
    last_cash_transaction: Option<TransactionId>,
}

impl NotificationCoordinator {
    /// Creates a coordinator for the signed-in user, if any.
    #[must_use]
    pub fn new(local_user_id: Option<UserId>) -> Self {
        Self {
            local_user_id,
            ..Self::default()
        }
    }

    /// Signed-in user.
    #[must_use]
    pub const fn local_user_id(&self) -> Option<UserId> {
        self.local_user_id
    }

    /// Changes the signed-in user (login, logout).
    pub fn set_local_user(&mut self, user_id: Option<UserId>) {
        self.local_user_id = user_id;
    }

    /// Auction currently shown, if any.
    #[must_use]
    pub const fn displayed_auction(&self) -> Option<&Auction> {
        self.displayed_auction.as_ref()
    }

    /// Incoming trade currently shown, if any.
    #[must_use]
    pub const fn displayed_trade(&self) -> Option<TradeId> {
        self.displayed_trade
    }

    /// Whether the results of a finished game were seen.
    #[must_use]
    pub const fn results_viewed(&self) -> bool {
        self.results_viewed
    }

    /// Records that the results screen was seen.
    pub fn mark_results_viewed(&mut self) {
        self.results_viewed = true;
    }

    /// Records that the view closed the incoming-trade modal itself.
    pub fn dismiss_trade(&mut self) {
        self.displayed_trade = None;
    }

    /// Folds one event into the view state and returns its effects.
    pub fn apply(&mut self, event: &GameEvent, snapshot: &GameSnapshot) -> Vec<UiEffect> {
        match event {
            GameEvent::TransactionCreated(tx) => {
                let local = self
                    .local_user_id
                    .and_then(|u| snapshot.participant_of_user(u))
                    .map(|p| p.id);
                let incoming = local.is_some() && tx.to_participant_id == local;
                if incoming && self.last_cash_transaction != Some(tx.id) {
                    self.last_cash_transaction = Some(tx.id);
                    return vec![UiEffect::Play { cue: AudioCue::Cash }];
                }
                Vec::new()
            }
            GameEvent::ParticipantUpdated(update) => {
                let name = snapshot
                    .participant(update.id)
                    .map_or(FALLBACK_NAME, Participant::display_name);
                vec![UiEffect::info(format!(
                    "{name} moved to {}",
                    space_label(update.position)
                ))]
            }
            GameEvent::AuctionUpdated(auction) => self.on_auction(auction),
            GameEvent::TradeUpdated(trade) => self.on_trade(trade),
            GameEvent::TurnUpdated {
                current_turn_user_id: Some(user_id),
                ..
            } => {
                if Some(*user_id) == self.local_user_id {
                    vec![UiEffect::Play {
                        cue: AudioCue::YourTurn,
                    }]
                } else {
                    vec![UiEffect::info(format!(
                        "It's {}'s turn",
                        snapshot.name_of_user(*user_id)
                    ))]
                }
            }
            GameEvent::GameUpdated {
                status: GameStatus::Finished,
                ..
            } => {
                self.results_viewed = false;
                vec![UiEffect::ResetResultsViewed]
            }
            _ => Vec::new(),
        }
    }

    fn on_auction(&mut self, auction: &Auction) -> Vec<UiEffect> {
        if auction.status == AuctionStatus::Active {
            self.displayed_auction = Some(auction.clone());
            return vec![UiEffect::ShowAuction {
                auction: auction.clone(),
            }];
        }
        self.displayed_auction = None;
        vec![
            UiEffect::ClearAuction,
            UiEffect::Invalidate {
                kind: QueryKind::GameProperties,
            },
            UiEffect::Invalidate {
                kind: QueryKind::Participants,
            },
        ]
    }

    fn on_trade(&mut self, trade: &Trade) -> Vec<UiEffect> {
        let mut effects = Vec::new();
        if trade.status == TradeStatus::Pending {
            if Some(trade.target_id) == self.local_user_id {
                self.displayed_trade = Some(trade.id);
                effects.push(UiEffect::ShowIncomingTrade {
                    trade: trade.clone(),
                });
                effects.push(UiEffect::Play {
                    cue: AudioCue::Notification,
                });
            }
            return effects;
        }
        if self.displayed_trade == Some(trade.id) {
            self.displayed_trade = None;
            effects.push(UiEffect::ClearIncomingTrade { trade_id: trade.id });
        }
        if trade.status == TradeStatus::Accepted {
            effects.push(UiEffect::Invalidate {
                kind: QueryKind::GameProperties,
            });
            effects.push(UiEffect::Invalidate {
                kind: QueryKind::Participants,
            });
        }
        effects
    }
}

/// Supplies the participant snapshot the coordinator resolves names from.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Returns the current snapshot of `game_id`.
    async fn snapshot(&self, game_id: GameId) -> GameSnapshot;
}

/// How long the first participant fetch may hold up an event.
pub const SNAPSHOT_FETCH_TIMEOUT: Duration = Duration::from_secs(1);

/// Upper bound for a background participant refresh.
const SNAPSHOT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads participants from the cache for name resolution.
///
/// This runs on the connection task, so it never waits on a refetch of a
/// list that is already cached: a stale list is used as is and, when a
/// client is available, refreshed by a spawned task. Only a game with no
/// cached list at all fetches inline, bounded by the fetch timeout; on
/// timeout names fall back and the fetch continues in the background.
#[derive(Debug, Clone)]
pub struct CachedSnapshot {
    cache: Arc<QueryCache>,
    api: Option<Arc<ApiClient>>,
    fetch_timeout: Duration,
    refreshing: Arc<AtomicBool>,
}

impl CachedSnapshot {
    /// Snapshot source backed by `cache` and, optionally, `api`.
    #[must_use]
    pub fn new(cache: Arc<QueryCache>, api: Option<Arc<ApiClient>>) -> Self {
        Self {
            cache,
            api,
            fetch_timeout: SNAPSHOT_FETCH_TIMEOUT,
            refreshing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Overrides the inline fetch timeout.
    #[must_use]
    pub const fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Refetches the list on its own task. At most one refresh runs at a time.
    fn refresh_in_background(&self, api: &Arc<ApiClient>, key: CacheKey) {
        if self.refreshing.swap(true, Ordering::AcqRel) {
            return;
        }
        let cache = Arc::clone(&self.cache);
        let api = Arc::clone(api);
        let refreshing = Arc::clone(&self.refreshing);
        tokio::spawn(async move {
            let fetch = cache.read_through::<serde_json::Value, _, _>(key, move || async move {
                api.fetch_query(key).await
            });
            match tokio::time::timeout(SNAPSHOT_REFRESH_TIMEOUT, fetch).await {
                Ok(Ok(_)) => tracing::trace!(key = %key, "participants refreshed"),
                Ok(Err(e)) => tracing::debug!(key = %key, error = %e, "participant refresh failed"),
                Err(_) => tracing::debug!(key = %key, "participant refresh timed out"),
            }
            refreshing.store(false, Ordering::Release);
        });
    }
}

#[async_trait]
impl SnapshotSource for CachedSnapshot {
    async fn snapshot(&self, game_id: GameId) -> GameSnapshot {
        let key = CacheKey::new(QueryKind::Participants, game_id);
        let cached = match self.cache.get::<Vec<Participant>>(key).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::debug!(%game_id, error = %e, "cached participants unreadable");
                None
            }
        };
        let participants = match (cached, &self.api) {
            (Some(list), Some(api)) => {
                if self.cache.is_stale(key).await != Some(false) {
                    self.refresh_in_background(api, key);
                }
                list
            }
            (Some(list), None) => list,
            (None, Some(api)) => {
                let fetch = self
                    .cache
                    .read_through::<Vec<Participant>, _, _>(key, || async move { api.fetch_query(key).await });
                match tokio::time::timeout(self.fetch_timeout, fetch).await {
                    Ok(Ok(list)) => list,
                    Ok(Err(e)) => {
                        tracing::debug!(%game_id, error = %e, "participant snapshot unavailable");
                        Vec::new()
                    }
                    Err(_) => {
                        tracing::debug!(%game_id, "participant fetch slow, resolving names later");
                        self.refresh_in_background(api, key);
                        Vec::new()
                    }
                }
            }
            (None, None) => Vec::new(),
        };
        GameSnapshot { participants }
    }
}

/// Event handler that runs the coordinator and publishes its effects.
///
/// `Invalidate` effects are applied to the cache and `Play` effects are sent
/// to the audio sink before the update is published on the bus.
pub struct CoordinatorHandler {
    coordinator: Mutex<NotificationCoordinator>,
    snapshots: Arc<dyn SnapshotSource>,
    cache: Arc<QueryCache>,
    bus: UpdateBus,
    audio: Arc<dyn AudioSink>,
}

impl std::fmt::Debug for CoordinatorHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorHandler")
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

impl CoordinatorHandler {
    /// Creates a handler.
    #[must_use]
    pub fn new(
        coordinator: NotificationCoordinator,
        snapshots: Arc<dyn SnapshotSource>,
        cache: Arc<QueryCache>,
        bus: UpdateBus,
        audio: Arc<dyn AudioSink>,
    ) -> Self {
        Self {
            coordinator: Mutex::new(coordinator),
            snapshots,
            cache,
            bus,
            audio,
        }
    }

    /// Runs `f` against the coordinator state.
    pub async fn with_coordinator<R>(&self, f: impl FnOnce(&mut NotificationCoordinator) -> R) -> R {
        let mut guard = self.coordinator.lock().await;
        f(&mut guard)
    }
}

#[async_trait]
impl EventHandler for CoordinatorHandler {
    async fn handle(&self, game_id: GameId, event: GameEvent) {
        let snapshot = self.snapshots.snapshot(game_id).await;
        let effects = self.coordinator.lock().await.apply(&event, &snapshot);

        for effect in &effects {
            match effect {
                UiEffect::Invalidate { kind } => {
                    self.cache.invalidate(CacheKey::new(*kind, game_id)).await;
                }
                UiEffect::Play { cue } => play_cue(self.audio.as_ref(), *cue),
                _ => {}
            }
        }
        tracing::debug!(%game_id, event_type = event.event_type(), effects = effects.len(), "event coordinated");
        self.bus.publish(SyncUpdate::Dispatched {
            game_id,
            event,
            effects,
        });
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{AuctionId, PropertyId, Transaction};
    use crate::domain::game_event::ParticipantUpdate;

    fn participant(user_id: UserId, game_id: GameId, first_name: &str) -> Participant {
        Participant {
            id: ParticipantId::new(),
            user_id,
            game_id,
            username: None,
            first_name: first_name.to_string(),
            last_name: String::new(),
            balance: 1500,
            position: 0,
        }
    }

    struct Fixture {
        game_id: GameId,
        me: UserId,
        other: UserId,
        snapshot: GameSnapshot,
    }

    fn fixture() -> Fixture {
        let game_id = GameId::new();
        let me = UserId::new();
        let other = UserId::new();
        let snapshot = GameSnapshot {
            participants: vec![
                participant(me, game_id, "Ana"),
                participant(other, game_id, "Luis"),
            ],
        };
        Fixture {
            game_id,
            me,
            other,
            snapshot,
        }
    }

    fn trade(fx: &Fixture, id: TradeId, status: TradeStatus) -> Trade {
        Trade {
            id,
            game_id: fx.game_id,
            initiator_id: fx.other,
            target_id: fx.me,
            offer_cash: 100,
            request_cash: 0,
            offer_properties: Vec::new(),
            request_properties: vec![PropertyId::new()],
            offer_cards: Vec::new(),
            request_cards: Vec::new(),
            status,
            created_at: None,
        }
    }

    fn auction(fx: &Fixture, status: AuctionStatus) -> Auction {
        Auction {
            id: AuctionId::new(),
            game_id: fx.game_id,
            property_id: PropertyId::new(),
            current_bid: 50,
            highest_bidder_id: None,
            status,
            created_at: None,
            ends_at: None,
        }
    }

    fn has_toast(effects: &[UiEffect]) -> bool {
        effects.iter().any(|e| matches!(e, UiEffect::Toast { .. }))
    }

    #[test]
    fn local_turn_plays_cue_without_toast() {
        let fx = fixture();
        let mut coord = NotificationCoordinator::new(Some(fx.me));
        let effects = coord.apply(
            &GameEvent::TurnUpdated {
                game_id: fx.game_id,
                current_turn_user_id: Some(fx.me),
            },
            &fx.snapshot,
        );
        assert_eq!(effects, vec![UiEffect::Play { cue: AudioCue::YourTurn }]);
        assert!(!has_toast(&effects));
    }

    #[test]
    fn other_turn_toasts_their_name() {
        let fx = fixture();
        let mut coord = NotificationCoordinator::new(Some(fx.me));
        let effects = coord.apply(
            &GameEvent::TurnUpdated {
                game_id: fx.game_id,
                current_turn_user_id: Some(fx.other),
            },
            &fx.snapshot,
        );
        assert_eq!(effects, vec![UiEffect::info("It's Luis's turn")]);
    }

    #[test]
    fn accepted_trade_clears_exactly_once() {
        let fx = fixture();
        let mut coord = NotificationCoordinator::new(Some(fx.me));
        let id = TradeId::new();

        let shown = coord.apply(
            &GameEvent::TradeUpdated(trade(&fx, id, TradeStatus::Pending)),
            &fx.snapshot,
        );
        assert!(matches!(shown.first(), Some(UiEffect::ShowIncomingTrade { .. })));
        assert!(shown.contains(&UiEffect::Play { cue: AudioCue::Notification }));
        assert_eq!(coord.displayed_trade(), Some(id));

        let accepted = GameEvent::TradeUpdated(trade(&fx, id, TradeStatus::Accepted));
        let first = coord.apply(&accepted, &fx.snapshot);
        assert_eq!(
            first,
            vec![
                UiEffect::ClearIncomingTrade { trade_id: id },
                UiEffect::Invalidate { kind: QueryKind::GameProperties },
                UiEffect::Invalidate { kind: QueryKind::Participants },
            ]
        );
        assert_eq!(coord.displayed_trade(), None);

        let second = coord.apply(&accepted, &fx.snapshot);
        assert!(!second.iter().any(|e| matches!(e, UiEffect::ClearIncomingTrade { .. })));
    }

    #[test]
    fn rejected_trade_for_another_id_keeps_display() {
        let fx = fixture();
        let mut coord = NotificationCoordinator::new(Some(fx.me));
        let shown = TradeId::new();
        coord.apply(&GameEvent::TradeUpdated(trade(&fx, shown, TradeStatus::Pending)), &fx.snapshot);

        let effects = coord.apply(
            &GameEvent::TradeUpdated(trade(&fx, TradeId::new(), TradeStatus::Rejected)),
            &fx.snapshot,
        );
        assert!(effects.is_empty());
        assert_eq!(coord.displayed_trade(), Some(shown));
    }

    #[test]
    fn pending_trade_for_someone_else_is_ignored() {
        let fx = fixture();
        let mut coord = NotificationCoordinator::new(Some(fx.other));
        let effects = coord.apply(
            &GameEvent::TradeUpdated(trade(&fx, TradeId::new(), TradeStatus::Pending)),
            &fx.snapshot,
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn auction_lifecycle() {
        let fx = fixture();
        let mut coord = NotificationCoordinator::new(Some(fx.me));
        let active = auction(&fx, AuctionStatus::Active);
        let effects = coord.apply(&GameEvent::AuctionUpdated(active.clone()), &fx.snapshot);
        assert_eq!(effects, vec![UiEffect::ShowAuction { auction: active }]);
        assert!(coord.displayed_auction().is_some());

        let effects = coord.apply(
            &GameEvent::AuctionUpdated(auction(&fx, AuctionStatus::Finished)),
            &fx.snapshot,
        );
        assert!(effects.contains(&UiEffect::ClearAuction));
        assert!(effects.contains(&UiEffect::Invalidate { kind: QueryKind::GameProperties }));
        assert!(effects.contains(&UiEffect::Invalidate { kind: QueryKind::Participants }));
        assert!(coord.displayed_auction().is_none());
    }

    #[test]
    fn participant_move_names_the_space() {
        let fx = fixture();
        let mut coord = NotificationCoordinator::new(Some(fx.me));
        let Some(luis) = fx.snapshot.participant_of_user(fx.other) else {
            panic!("fixture participant missing");
        };
        let update = ParticipantUpdate {
            id: luis.id,
            user_id: fx.other,
            game_id: fx.game_id,
            balance: 1500,
            position: 40,
            created_at: None,
        };
        let effects = coord.apply(&GameEvent::ParticipantUpdated(update), &fx.snapshot);
        let Some(UiEffect::Toast { message, .. }) = effects.first() else {
            panic!("expected a toast");
        };
        assert!(message.starts_with("Luis moved to "));
        assert!(message.ends_with(space_label(0)));
    }

    #[test]
    fn unknown_seat_uses_fallback_name() {
        let fx = fixture();
        let mut coord = NotificationCoordinator::new(None);
        let update = ParticipantUpdate {
            id: ParticipantId::new(),
            user_id: UserId::new(),
            game_id: fx.game_id,
            balance: 0,
            position: 5,
            created_at: None,
        };
        let effects = coord.apply(&GameEvent::ParticipantUpdated(update), &fx.snapshot);
        assert_eq!(effects, vec![UiEffect::info(format!("Jugador moved to {}", space_label(5)))]);
    }

    #[test]
    fn finished_game_resets_results_flag() {
        let fx = fixture();
        let mut coord = NotificationCoordinator::new(Some(fx.me));
        coord.mark_results_viewed();
        let effects = coord.apply(
            &GameEvent::GameUpdated {
                id: fx.game_id,
                status: GameStatus::Finished,
            },
            &fx.snapshot,
        );
        assert_eq!(effects, vec![UiEffect::ResetResultsViewed]);
        assert!(!coord.results_viewed());
    }

    #[test]
    fn cash_cue_plays_once_per_transaction() {
        let fx = fixture();
        let mut coord = NotificationCoordinator::new(Some(fx.me));
        let Some(me) = fx.snapshot.participant_of_user(fx.me) else {
            panic!("fixture participant missing");
        };
        let tx = Transaction {
            id: TransactionId::new(),
            game_id: fx.game_id,
            from_participant_id: None,
            to_participant_id: Some(me.id),
            amount: 200,
            description: Some("Salary".to_string()),
            created_at: None,
        };
        let event = GameEvent::TransactionCreated(tx);
        assert_eq!(
            coord.apply(&event, &fx.snapshot),
            vec![UiEffect::Play { cue: AudioCue::Cash }]
        );
        assert!(coord.apply(&event, &fx.snapshot).is_empty());
    }

    struct Fixed(GameSnapshot);

    #[async_trait]
    impl SnapshotSource for Fixed {
        async fn snapshot(&self, _game_id: GameId) -> GameSnapshot {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn handler_applies_invalidations_and_publishes() {
        let fx = fixture();
        let cache = Arc::new(QueryCache::new());
        let key = CacheKey::new(QueryKind::GameProperties, fx.game_id);
        cache.put_raw(key, serde_json::json!([])).await;
        let bus = UpdateBus::new(16);
        let mut rx = bus.subscribe();

        let handler = CoordinatorHandler::new(
            NotificationCoordinator::new(Some(fx.me)),
            Arc::new(Fixed(fx.snapshot.clone())),
            Arc::clone(&cache),
            bus,
            Arc::new(super::super::effects::LogAudioSink),
        );
        handler
            .handle(
                fx.game_id,
                GameEvent::AuctionUpdated(auction(&fx, AuctionStatus::Finished)),
            )
            .await;

        assert_eq!(cache.is_stale(key).await, Some(true));
        let Ok(SyncUpdate::Dispatched { effects, .. }) = rx.recv().await else {
            panic!("expected a dispatched update");
        };
        assert!(effects.contains(&UiEffect::ClearAuction));
    }

    #[tokio::test]
    async fn cached_snapshot_reads_stale_participants_without_client() {
        let fx = fixture();
        let cache = Arc::new(QueryCache::new());
        let key = CacheKey::new(QueryKind::Participants, fx.game_id);
        let Ok(()) = cache.put(key, &fx.snapshot.participants).await else {
            panic!("put failed");
        };
        cache.invalidate(key).await;

        let source = CachedSnapshot::new(Arc::clone(&cache), None);
        assert_eq!(source.snapshot(fx.game_id).await, fx.snapshot);
        assert!(source.snapshot(GameId::new()).await.participants.is_empty());
    }

    /// A client whose server accepts connections but never answers.
    async fn unresponsive_api() -> (Arc<ApiClient>, tokio::net::TcpListener) {
        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        let Ok(base) = url::Url::parse(&format!("http://{addr}")) else {
            panic!("bad base url");
        };
        let session = Arc::new(crate::session::SessionContext::new());
        let Ok(api) = ApiClient::new(&crate::config::ClientConfig::new(base), session) else {
            panic!("client should build");
        };
        (Arc::new(api), listener)
    }

    #[tokio::test]
    async fn stale_participants_resolve_without_waiting_on_the_server() {
        let fx = fixture();
        let cache = Arc::new(QueryCache::new());
        let key = CacheKey::new(QueryKind::Participants, fx.game_id);
        let Ok(()) = cache.put(key, &fx.snapshot.participants).await else {
            panic!("put failed");
        };
        cache.invalidate(key).await;
        let (api, _listener) = unresponsive_api().await;

        let source = CachedSnapshot::new(Arc::clone(&cache), Some(api));
        let snapshot = tokio::time::timeout(Duration::from_millis(500), source.snapshot(fx.game_id)).await;
        assert_eq!(snapshot.ok(), Some(fx.snapshot.clone()));
    }

    #[tokio::test]
    async fn first_participant_fetch_is_bounded() {
        let fx = fixture();
        let cache = Arc::new(QueryCache::new());
        let (api, _listener) = unresponsive_api().await;

        let source = CachedSnapshot::new(Arc::clone(&cache), Some(api))
            .with_fetch_timeout(Duration::from_millis(50));
        let snapshot = tokio::time::timeout(Duration::from_secs(2), source.snapshot(fx.game_id)).await;
        let Ok(snapshot) = snapshot else {
            panic!("snapshot waited on the server");
        };
        assert!(snapshot.participants.is_empty());
    }
}
