//! Cache key vocabulary.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::domain::GameId;

/// A game-scoped view the client caches.
///
/// The string form of each kind is the key the views subscribe to; the
/// REST path is where a stale view is refetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryKind {
    /// Transaction log.
    Transactions,
    /// Participant list with balances and positions.
    Participants,
    /// Game session row (status, turn, jackpot).
    Game,
    /// Dice roll history.
    DiceRolls,
    /// Roulette spin history.
    RouletteHistory,
    /// Special dice history.
    SpecialDiceHistory,
    /// The three vault-market slots.
    BovedaMarket,
    /// The active auction, if any.
    ActiveAuction,
    /// Property ownership in this game.
    GameProperties,
    /// Open trades.
    Trades,
    /// The local participant's cards.
    Inventory,
}

impl QueryKind {
    /// Every kind, used for the full stale flush after a reconnect.
    pub const ALL: [Self; 11] = [
        Self::Transactions,
        Self::Participants,
        Self::Game,
        Self::DiceRolls,
        Self::RouletteHistory,
        Self::SpecialDiceHistory,
        Self::BovedaMarket,
        Self::ActiveAuction,
        Self::GameProperties,
        Self::Trades,
        Self::Inventory,
    ];

    /// Returns the view key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::Participants => "participants",
            Self::Game => "game",
            Self::DiceRolls => "dice_rolls",
            Self::RouletteHistory => "roulette-history",
            Self::SpecialDiceHistory => "special-dice-history",
            Self::BovedaMarket => "boveda-market",
            Self::ActiveAuction => "active-auction",
            Self::GameProperties => "gameProperties",
            Self::Trades => "trades",
            Self::Inventory => "inventory",
        }
    }

    /// Returns the REST path that serves this view, relative to the API base.
    #[must_use]
    pub fn path(self, game_id: GameId) -> String {
        let suffix = match self {
            Self::Game => "",
            Self::Transactions => "/transactions",
            Self::Participants => "/participants",
            Self::DiceRolls => "/rolls",
            Self::RouletteHistory => "/roulette",
            Self::SpecialDiceHistory => "/special-dice",
            Self::BovedaMarket => "/cards/market",
            Self::ActiveAuction => "/auctions",
            Self::GameProperties => "/properties",
            Self::Trades => "/trades",
            Self::Inventory => "/cards/inventory",
        };
        format!("games/{game_id}{suffix}")
    }
}

impl Serialize for QueryKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cache slot: one view of one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    /// View.
    pub kind: QueryKind,
    /// Game.
    pub game_id: GameId,
}

impl CacheKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(kind: QueryKind, game_id: GameId) -> Self {
        Self { kind, game_id }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.kind, self.game_id)
    }
}
