//! Frame dispatch: parse, invalidate, forward.
//!
//! Each inbound text frame is parsed into a [`GameEvent`]. For a known tag
//! the cached views listed by [`invalidations`] are marked stale first, then
//! the event is handed to the current handler. Unknown tags invalidate
//! nothing and are still forwarded. A known tag whose payload fails
//! validation gets its invalidations and reaches the handler as
//! [`GameEvent::Unknown`] with the raw payload. A frame that is not a valid
//! envelope is logged and dropped; the stream stays open either way.

use std::sync::Arc;

use super::handler::HandlerSlot;
use crate::cache::{QueryCache, QueryKind};
use crate::domain::{EventKind, GameEvent, GameId, RawFrame};
use crate::error::ClientError;

/// Cached views made stale by an event of the given kind.
#[must_use]
pub const fn invalidations(kind: EventKind) -> &'static [QueryKind] {
    match kind {
        EventKind::TransactionCreated => &[
            QueryKind::Transactions,
            QueryKind::Participants,
            QueryKind::Game,
        ],
        EventKind::DiceRolled => &[QueryKind::DiceRolls],
        EventKind::RouletteSpun => &[QueryKind::RouletteHistory],
        EventKind::SpecialDiceRolled => &[QueryKind::SpecialDiceHistory],
        EventKind::ParticipantUpdated => &[QueryKind::Participants],
        EventKind::MarketUpdated => &[QueryKind::BovedaMarket],
        EventKind::TurnUpdated => &[QueryKind::Game, QueryKind::Participants],
        EventKind::GameUpdated => &[QueryKind::Game],
        EventKind::AuctionUpdated => &[QueryKind::ActiveAuction, QueryKind::GameProperties],
        EventKind::TradeUpdated => &[QueryKind::Trades],
        EventKind::PropertyUpdated => &[QueryKind::GameProperties],
    }
}

/// What happened to one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The event was forwarded to the handler.
    Forwarded {
        /// Wire tag.
        event_type: String,
        /// Number of query kinds invalidated.
        invalidated: usize,
    },
    /// A known tag carried an invalid payload. Its invalidations were
    /// applied and the frame was forwarded as [`GameEvent::Unknown`].
    ForwardedRaw {
        /// Wire tag.
        event_type: String,
        /// Number of query kinds invalidated.
        invalidated: usize,
    },
    /// The frame was not a `{type, payload}` envelope.
    Dropped,
}

/// Dispatches the frames of one game's stream.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    game_id: GameId,
    cache: Arc<QueryCache>,
    handler: HandlerSlot,
}

impl EventDispatcher {
    /// Creates a dispatcher for `game_id`.
    #[must_use]
    pub const fn new(game_id: GameId, cache: Arc<QueryCache>, handler: HandlerSlot) -> Self {
        Self {
            game_id,
            cache,
            handler,
        }
    }

    /// Game whose cached views this dispatcher invalidates.
    #[must_use]
    pub const fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Handles one text frame.
    pub async fn dispatch(&self, text: &str) -> DispatchOutcome {
        let frame: RawFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(game_id = %self.game_id, error = %e, "dropping unparsable frame");
                return DispatchOutcome::Dropped;
            }
        };
        match GameEvent::from_frame(frame.clone()) {
            Ok(event) => self.forward(event).await,
            Err(e) => {
                let RawFrame {
                    event_type,
                    payload,
                } = frame;
                let reason = match e {
                    ClientError::InvalidPayload { reason, .. } => reason,
                    other => other.to_string(),
                };
                tracing::warn!(game_id = %self.game_id, %event_type, %reason, "invalid event payload, forwarding raw");
                let kinds = EventKind::from_tag(&event_type).map_or(&[][..], invalidations);
                self.cache.invalidate_kinds(self.game_id, kinds).await;
                self.handler
                    .current()
                    .handle(
                        self.game_id,
                        GameEvent::Unknown {
                            event_type: event_type.clone(),
                            payload,
                        },
                    )
                    .await;
                DispatchOutcome::ForwardedRaw {
                    event_type,
                    invalidated: kinds.len(),
                }
            }
        }
    }

    /// Applies the invalidations of an already-parsed event, then forwards it.
    pub async fn forward(&self, event: GameEvent) -> DispatchOutcome {
        let kinds = event.kind().map_or(&[][..], invalidations);
        if !kinds.is_empty() {
            self.cache.invalidate_kinds(self.game_id, kinds).await;
        }
        let event_type = event.event_type().to_string();
        if event.kind().is_none() {
            tracing::debug!(game_id = %self.game_id, %event_type, "forwarding unrecognized event");
        }
        if let Some(other) = event.game_id().filter(|id| *id != self.game_id) {
            tracing::debug!(game_id = %self.game_id, payload_game_id = %other, %event_type, "event names another game");
        }
        self.handler.current().handle(self.game_id, event).await;
        DispatchOutcome::Forwarded {
            event_type,
            invalidated: kinds.len(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::cache::CacheKey;
    use crate::sync::handler::EventHandler;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<GameEvent>>);

    #[async_trait]
    impl EventHandler for Recorder {
        async fn handle(&self, _game_id: GameId, event: GameEvent) {
            if let Ok(mut events) = self.0.lock() {
                events.push(event);
            }
        }
    }

    impl Recorder {
        fn len(&self) -> usize {
            self.0.lock().map(|e| e.len()).unwrap_or(0)
        }
    }

    async fn primed(game_id: GameId) -> Arc<QueryCache> {
        let cache = Arc::new(QueryCache::new());
        for kind in QueryKind::ALL {
            cache
                .put_raw(CacheKey::new(kind, game_id), serde_json::json!([]))
                .await;
        }
        cache
    }

    async fn stale_kinds(cache: &QueryCache, game_id: GameId) -> Vec<QueryKind> {
        let mut out = Vec::new();
        for kind in QueryKind::ALL {
            if cache.is_stale(CacheKey::new(kind, game_id)).await == Some(true) {
                out.push(kind);
            }
        }
        out
    }

    fn setup(game_id: GameId, cache: &Arc<QueryCache>) -> (EventDispatcher, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let slot = HandlerSlot::new(Arc::clone(&recorder) as Arc<dyn EventHandler>);
        (EventDispatcher::new(game_id, Arc::clone(cache), slot), recorder)
    }

    #[test]
    fn every_kind_invalidates_something() {
        for kind in EventKind::ALL {
            assert!(!invalidations(kind).is_empty(), "{kind:?}");
        }
        assert_eq!(
            invalidations(EventKind::TransactionCreated),
            &[QueryKind::Transactions, QueryKind::Participants, QueryKind::Game]
        );
    }

    #[tokio::test]
    async fn turn_update_invalidates_game_and_participants() {
        let game_id = GameId::new();
        let cache = primed(game_id).await;
        let (dispatcher, recorder) = setup(game_id, &cache);

        let frame = serde_json::json!({
            "type": "TurnUpdated",
            "payload": { "game_id": game_id, "current_turn_user_id": null }
        })
        .to_string();
        let outcome = dispatcher.dispatch(&frame).await;

        assert_eq!(
            outcome,
            DispatchOutcome::Forwarded {
                event_type: "TurnUpdated".to_string(),
                invalidated: 2
            }
        );
        assert_eq!(
            stale_kinds(&cache, game_id).await,
            vec![QueryKind::Participants, QueryKind::Game]
        );
        assert_eq!(recorder.len(), 1);
    }

    #[tokio::test]
    async fn unknown_type_is_forwarded_without_invalidation() {
        let game_id = GameId::new();
        let cache = primed(game_id).await;
        let (dispatcher, recorder) = setup(game_id, &cache);

        let outcome = dispatcher
            .dispatch(r#"{"type":"ChatMessage","payload":{"text":"hola"}}"#)
            .await;

        assert_eq!(
            outcome,
            DispatchOutcome::Forwarded {
                event_type: "ChatMessage".to_string(),
                invalidated: 0
            }
        );
        assert!(stale_kinds(&cache, game_id).await.is_empty());
        assert_eq!(recorder.len(), 1);
    }

    #[tokio::test]
    async fn malformed_frame_is_dropped() {
        let game_id = GameId::new();
        let cache = primed(game_id).await;
        let (dispatcher, recorder) = setup(game_id, &cache);

        assert_eq!(dispatcher.dispatch("not json").await, DispatchOutcome::Dropped);
        assert_eq!(dispatcher.dispatch(r#"{"payload":{}}"#).await, DispatchOutcome::Dropped);
        assert!(stale_kinds(&cache, game_id).await.is_empty());
        assert_eq!(recorder.len(), 0);
    }

    #[tokio::test]
    async fn invalid_payload_is_invalidated_and_forwarded_raw() {
        let game_id = GameId::new();
        let cache = primed(game_id).await;
        let (dispatcher, recorder) = setup(game_id, &cache);

        let outcome = dispatcher
            .dispatch(r#"{"type":"DiceRolled","payload":{"total":"seven"}}"#)
            .await;

        assert_eq!(
            outcome,
            DispatchOutcome::ForwardedRaw {
                event_type: "DiceRolled".to_string(),
                invalidated: 1
            }
        );
        assert_eq!(stale_kinds(&cache, game_id).await, vec![QueryKind::DiceRolls]);
        assert_eq!(recorder.len(), 1);
        let events = recorder.0.lock().map(|e| e.clone()).unwrap_or_default();
        assert!(matches!(
            events.first(),
            Some(GameEvent::Unknown { event_type, payload })
                if event_type == "DiceRolled" && payload.get("total") == Some(&serde_json::json!("seven"))
        ));
    }
}
