//! Events pushed by the game server over the event stream.
//!
//! Every inbound text frame is a JSON envelope `{"type": ..., "payload": ...}`.
//! [`GameEvent::parse`] validates the envelope and the payload of every known
//! tag at the boundary, producing a closed sum type. Tags this client does
//! not know become [`GameEvent::Unknown`] and still reach the handler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use super::entities::{Auction, DiceRoll, GameStatus, RouletteSpin, SpecialDiceRoll, Trade, Transaction};
use super::ids::{GameId, ParticipantId, UserId};
use super::wire;
use crate::error::ClientError;

/// The raw `{type, payload}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFrame {
    /// Event tag.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event body. Missing payloads decode as `null`.
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// The closed set of event tags this client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A ledger entry was created or reversed.
    TransactionCreated,
    /// Someone rolled the dice.
    DiceRolled,
    /// Someone spun the roulette.
    RouletteSpun,
    /// Someone rolled a special die.
    SpecialDiceRolled,
    /// A participant moved or had their balance changed.
    ParticipantUpdated,
    /// The vault market rotated.
    MarketUpdated,
    /// The active player changed.
    TurnUpdated,
    /// Game metadata or status changed.
    GameUpdated,
    /// An auction started, got a bid, or ended.
    AuctionUpdated,
    /// A trade was proposed or answered.
    TradeUpdated,
    /// Property ownership or buildings changed.
    PropertyUpdated,
}

impl EventKind {
    /// Every known kind.
    pub const ALL: [Self; 11] = [
        Self::TransactionCreated,
        Self::DiceRolled,
        Self::RouletteSpun,
        Self::SpecialDiceRolled,
        Self::ParticipantUpdated,
        Self::MarketUpdated,
        Self::TurnUpdated,
        Self::GameUpdated,
        Self::AuctionUpdated,
        Self::TradeUpdated,
        Self::PropertyUpdated,
    ];

    /// Resolves a wire tag. Matching is exact.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }

    /// Returns the wire tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TransactionCreated => "TransactionCreated",
            Self::DiceRolled => "DiceRolled",
            Self::RouletteSpun => "RouletteSpun",
            Self::SpecialDiceRolled => "SpecialDiceRolled",
            Self::ParticipantUpdated => "ParticipantUpdated",
            Self::MarketUpdated => "MarketUpdated",
            Self::TurnUpdated => "TurnUpdated",
            Self::GameUpdated => "GameUpdated",
            Self::AuctionUpdated => "AuctionUpdated",
            Self::TradeUpdated => "TradeUpdated",
            Self::PropertyUpdated => "PropertyUpdated",
        }
    }
}

/// Participant snapshot carried by `ParticipantUpdated`.
///
/// The server sends the bare seat row: no names, which the client resolves
/// from its cached participant list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantUpdate {
    /// Participant id.
    pub id: ParticipantId,
    /// Owning user.
    pub user_id: UserId,
    /// Game.
    pub game_id: GameId,
    /// Balance at the time of the event.
    #[serde(default, deserialize_with = "wire::amount")]
    pub balance: i64,
    /// New board position.
    #[serde(default)]
    pub position: i32,
    /// Seat creation time.
    #[serde(default, deserialize_with = "wire::opt_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct GameRef {
    game_id: GameId,
}

#[derive(Deserialize)]
struct TurnPayload {
    game_id: GameId,
    #[serde(default)]
    current_turn_user_id: Option<UserId>,
}

#[derive(Deserialize)]
struct GameUpdatePayload {
    id: GameId,
    status: GameStatus,
}

/// A validated server event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum GameEvent {
    /// A ledger entry was created.
    TransactionCreated(Transaction),
    /// A dice roll happened.
    DiceRolled(DiceRoll),
    /// A roulette spin happened.
    RouletteSpun(RouletteSpin),
    /// A special die was rolled.
    SpecialDiceRolled(SpecialDiceRoll),
    /// A participant changed.
    ParticipantUpdated(ParticipantUpdate),
    /// The vault market rotated.
    MarketUpdated {
        /// Game.
        game_id: GameId,
    },
    /// The active player changed.
    TurnUpdated {
        /// Game.
        game_id: GameId,
        /// New active player; `None` before turn order is set.
        current_turn_user_id: Option<UserId>,
    },
    /// Game status changed.
    GameUpdated {
        /// Game.
        id: GameId,
        /// New status.
        status: GameStatus,
    },
    /// An auction changed.
    AuctionUpdated(Auction),
    /// A trade changed.
    TradeUpdated(Trade),
    /// Property ownership changed. The payload shape is not fixed, so it is
    /// kept as raw JSON.
    PropertyUpdated(serde_json::Value),
    /// A tag this client does not recognize.
    Unknown {
        /// The unrecognized tag.
        event_type: String,
        /// The untouched payload.
        payload: serde_json::Value,
    },
}

impl GameEvent {
    /// Parses one inbound text frame.
    ///
    /// # Errors
    ///
    /// - [`ClientError::MalformedFrame`] if the text is not a JSON object
    ///   with a string `type`.
    /// - [`ClientError::InvalidPayload`] if the tag is known but the payload
    ///   does not match its schema. The error carries the tag so the caller
    ///   can still apply the tag's invalidations.
    pub fn parse(text: &str) -> Result<Self, ClientError> {
        let frame: RawFrame =
            serde_json::from_str(text).map_err(|e| ClientError::MalformedFrame(e.to_string()))?;
        Self::from_frame(frame)
    }

    /// Validates an already-split envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidPayload`] if a known tag carries a
    /// payload that does not match its schema.
    pub fn from_frame(frame: RawFrame) -> Result<Self, ClientError> {
        let Some(kind) = EventKind::from_tag(&frame.event_type) else {
            return Ok(Self::Unknown {
                event_type: frame.event_type,
                payload: frame.payload,
            });
        };
        let payload = frame.payload;
        let event = match kind {
            EventKind::TransactionCreated => Self::TransactionCreated(decode(kind, payload)?),
            EventKind::DiceRolled => Self::DiceRolled(decode(kind, payload)?),
            EventKind::RouletteSpun => Self::RouletteSpun(decode(kind, payload)?),
            EventKind::SpecialDiceRolled => Self::SpecialDiceRolled(decode(kind, payload)?),
            EventKind::ParticipantUpdated => Self::ParticipantUpdated(decode(kind, payload)?),
            EventKind::MarketUpdated => {
                let GameRef { game_id } = decode(kind, payload)?;
                Self::MarketUpdated { game_id }
            }
            EventKind::TurnUpdated => {
                let TurnPayload {
                    game_id,
                    current_turn_user_id,
                } = decode(kind, payload)?;
                Self::TurnUpdated {
                    game_id,
                    current_turn_user_id,
                }
            }
            EventKind::GameUpdated => {
                let GameUpdatePayload { id, status } = decode(kind, payload)?;
                Self::GameUpdated { id, status }
            }
            EventKind::AuctionUpdated => Self::AuctionUpdated(decode(kind, payload)?),
            EventKind::TradeUpdated => Self::TradeUpdated(decode(kind, payload)?),
            EventKind::PropertyUpdated => Self::PropertyUpdated(payload),
        };
        Ok(event)
    }

    /// Returns the known kind, or `None` for [`GameEvent::Unknown`].
    #[must_use]
    pub const fn kind(&self) -> Option<EventKind> {
        Some(match self {
            Self::TransactionCreated(_) => EventKind::TransactionCreated,
            Self::DiceRolled(_) => EventKind::DiceRolled,
            Self::RouletteSpun(_) => EventKind::RouletteSpun,
            Self::SpecialDiceRolled(_) => EventKind::SpecialDiceRolled,
            Self::ParticipantUpdated(_) => EventKind::ParticipantUpdated,
            Self::MarketUpdated { .. } => EventKind::MarketUpdated,
            Self::TurnUpdated { .. } => EventKind::TurnUpdated,
            Self::GameUpdated { .. } => EventKind::GameUpdated,
            Self::AuctionUpdated(_) => EventKind::AuctionUpdated,
            Self::TradeUpdated(_) => EventKind::TradeUpdated,
            Self::PropertyUpdated(_) => EventKind::PropertyUpdated,
            Self::Unknown { .. } => return None,
        })
    }

    /// Returns the wire tag of this event.
    #[must_use]
    pub fn event_type(&self) -> &str {
        match self {
            Self::Unknown { event_type, .. } => event_type,
            other => other.kind().map_or("Unknown", EventKind::as_str),
        }
    }

    /// Returns the game this event belongs to, when the payload names one.
    #[must_use]
    pub fn game_id(&self) -> Option<GameId> {
        match self {
            Self::TransactionCreated(t) => Some(t.game_id),
            Self::DiceRolled(d) => Some(d.game_id),
            Self::RouletteSpun(r) => Some(r.game_id),
            Self::SpecialDiceRolled(s) => Some(s.game_id),
            Self::ParticipantUpdated(p) => Some(p.game_id),
            Self::MarketUpdated { game_id } | Self::TurnUpdated { game_id, .. } => Some(*game_id),
            Self::GameUpdated { id, .. } => Some(*id),
            Self::AuctionUpdated(a) => Some(a.game_id),
            Self::TradeUpdated(t) => Some(t.game_id),
            Self::PropertyUpdated(_) | Self::Unknown { .. } => None,
        }
    }
}

fn decode<T: DeserializeOwned>(kind: EventKind, payload: serde_json::Value) -> Result<T, ClientError> {
    serde_json::from_value(payload).map_err(|e| ClientError::InvalidPayload {
        event_type: kind.as_str().to_string(),
        reason: e.to_string(),
    })
}
