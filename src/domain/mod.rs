//! Domain layer: entities, events, and pure game computations.
//!
//! This module contains the client-side view of the game model: typed
//! identifiers, the server entities as received over REST, the closed set
//! of pushed [`GameEvent`]s, the board layout, the bank-balance fold over
//! the transaction log, and rule hints. Nothing here performs I/O.

pub mod board;
pub mod entities;
pub mod game_event;
pub mod ids;
pub mod ledger;
pub mod rules;
pub mod wire;

pub use entities::{
    Auction, AuctionStatus, AuthUser, Card, CardColor, CardDetails, CardType, DiceHistoryItem,
    DiceRoll, GameSession, GameStatus, InventoryEntry, MarketSlot, Participant, ParticipantCard,
    ParticipantProperty, Property, RouletteSpin, SpecialDiceRoll, Trade, TradeStatus, Transaction,
};
pub use game_event::{EventKind, GameEvent, ParticipantUpdate, RawFrame};
pub use ids::{
    AuctionId, CardId, GameId, InventoryId, ParticipantId, PropertyId, RollId, TradeId,
    TransactionId, UserId,
};
pub use ledger::{TransferKind, TransferRequest};
