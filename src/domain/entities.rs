//! Server-owned entities as the client receives them.
//!
//! Nothing here is authoritative: every value is a copy of what the game
//! server last reported, either through a REST response or a pushed event.
//! Decoding is lenient (see [`super::wire`]) because the server serializes
//! money as SQL numerics and timestamps in more than one format.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{
    AuctionId, CardId, GameId, InventoryId, ParticipantId, PropertyId, RollId, TradeId,
    TransactionId, UserId,
};
use super::wire;

/// Lifecycle status of a game session.
///
/// Unrecognized strings decode as [`GameStatus::Waiting`], matching how the
/// server maps unknown database values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GameStatus {
    /// Lobby: players are joining.
    Waiting,
    /// Game in progress.
    Active,
    /// Temporarily halted by the host.
    Paused,
    /// Game over. Read-only from here on.
    Finished,
    /// Abandoned by the host. Treated like `Finished`.
    Cancelled,
}

impl GameStatus {
    /// Returns the wire form (`"ACTIVE"`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
            Self::Finished => "FINISHED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Returns `true` for statuses after which no mutation is accepted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }
}

impl From<String> for GameStatus {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Self::Active,
            "PAUSED" => Self::Paused,
            "FINISHED" => Self::Finished,
            "CANCELLED" => Self::Cancelled,
            _ => Self::Waiting,
        }
    }
}

impl From<GameStatus> for String {
    fn from(status: GameStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    /// Session id.
    pub id: GameId,
    /// Short join code shared with other players.
    pub code: String,
    /// User who created the session.
    pub host_user_id: UserId,
    /// Display name.
    pub name: String,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Creation time. Drives the session clock.
    #[serde(default, deserialize_with = "wire::opt_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    /// Time the game ended, if it has.
    #[serde(default, deserialize_with = "wire::opt_datetime")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Free-parking jackpot.
    #[serde(default, deserialize_with = "wire::amount")]
    pub jackpot_balance: i64,
    /// User whose turn it is, once turn order is set.
    #[serde(default)]
    pub current_turn_user_id: Option<UserId>,
    /// Turn order by user id.
    #[serde(default, deserialize_with = "wire::id_list")]
    pub turn_order: Vec<UserId>,
}

/// A user's seat in one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant id (referenced by transactions and trades).
    pub id: ParticipantId,
    /// Owning user.
    pub user_id: UserId,
    /// Game the seat belongs to.
    pub game_id: GameId,
    /// Login name, when the server joins it in.
    #[serde(default)]
    pub username: Option<String>,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Server-authoritative cash balance.
    #[serde(deserialize_with = "wire::amount")]
    pub balance: i64,
    /// Board position, 0..40. Cyclic.
    #[serde(default)]
    pub position: i32,
}

impl Participant {
    /// Name shown in toasts: first name, else username, else `"Jugador"`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if !self.first_name.trim().is_empty() {
            return &self.first_name;
        }
        match self.username.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => "Jugador",
        }
    }
}

/// A ledger entry. A `None` side is the Bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction id.
    pub id: TransactionId,
    /// Game the entry belongs to.
    pub game_id: GameId,
    /// Payer; `None` is the Bank.
    #[serde(default)]
    pub from_participant_id: Option<ParticipantId>,
    /// Payee; `None` is the Bank.
    #[serde(default)]
    pub to_participant_id: Option<ParticipantId>,
    /// Amount moved. Always positive for a valid entry.
    #[serde(deserialize_with = "wire::amount")]
    pub amount: i64,
    /// Free-text reason.
    #[serde(default)]
    pub description: Option<String>,
    /// Creation time.
    #[serde(default, deserialize_with = "wire::opt_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Returns `true` if the Bank is one of the two sides.
    #[must_use]
    pub const fn involves_bank(&self) -> bool {
        self.from_participant_id.is_none() || self.to_participant_id.is_none()
    }

    /// Returns `true` if the entry has a well-formed counterparty pair: not
    /// both sides Bank, not the same participant twice.
    #[must_use]
    pub fn has_valid_sides(&self) -> bool {
        match (self.from_participant_id, self.to_participant_id) {
            (None, None) => false,
            (Some(from), Some(to)) => from != to,
            _ => true,
        }
    }
}

/// A dice roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    /// Roll id.
    pub id: RollId,
    /// Game the roll belongs to.
    pub game_id: GameId,
    /// User who rolled.
    pub user_id: UserId,
    /// Number of dice.
    pub dice_count: i32,
    /// Faces per die.
    pub dice_sides: i32,
    /// Individual die results.
    #[serde(default)]
    pub results: Vec<i32>,
    /// Sum of results.
    pub total: i32,
    /// Roll time.
    #[serde(default, deserialize_with = "wire::opt_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A dice roll joined with the roller's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceHistoryItem {
    /// The roll.
    pub roll: DiceRoll,
    /// Roller's display name.
    #[serde(default)]
    pub user_name: String,
}

/// A roulette spin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouletteSpin {
    /// Spin id.
    pub id: uuid::Uuid,
    /// Game the spin belongs to.
    pub game_id: GameId,
    /// User who spun.
    pub user_id: UserId,
    /// Label of the landed segment.
    pub result_label: String,
    /// Numeric value of the landed segment.
    pub result_value: i32,
    /// Segment kind (`"red"` or `"green"`).
    pub result_type: String,
    /// Spin time.
    #[serde(default, deserialize_with = "wire::opt_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    /// Spinner's given name, present in history listings.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Spinner's family name, present in history listings.
    #[serde(default)]
    pub last_name: Option<String>,
}

/// A roll of one of the special (non-numeric) dice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialDiceRoll {
    /// Roll id.
    pub id: uuid::Uuid,
    /// Game the roll belongs to.
    pub game_id: GameId,
    /// User who rolled.
    pub user_id: UserId,
    /// Human name of the die.
    pub die_name: String,
    /// Stable die identifier.
    pub die_id: String,
    /// Label of the face shown.
    pub face_label: String,
    /// Numeric value of the face, if it has one.
    #[serde(default)]
    pub face_value: Option<i32>,
    /// Action keyword of the face, if it has one.
    #[serde(default)]
    pub face_action: Option<String>,
    /// Roll time.
    #[serde(default, deserialize_with = "wire::opt_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    /// Roller's given name, present in history listings.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Roller's family name, present in history listings.
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Deck a card belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CardType {
    /// Community chest.
    Arca,
    /// Chance.
    Fortuna,
    /// Bonus deck.
    Bonificacion,
    /// Vault deck, sold through the market.
    Boveda,
    /// A deck this client does not know.
    Other(String),
}

impl CardType {
    /// Returns the wire form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Arca => "arca",
            Self::Fortuna => "fortuna",
            Self::Bonificacion => "bonificacion",
            Self::Boveda => "boveda",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for CardType {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "arca" => Self::Arca,
            "fortuna" => Self::Fortuna,
            "bonificacion" => Self::Bonificacion,
            "boveda" => Self::Boveda,
            _ => Self::Other(s),
        }
    }
}

impl From<CardType> for String {
    fn from(t: CardType) -> Self {
        t.as_str().to_string()
    }
}

/// Card color, which encodes when the card takes effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CardColor {
    /// Yellow: passive, stays in the inventory.
    Passive,
    /// Red: resolves immediately.
    Instant,
    /// Green: win condition.
    Win,
    /// A color this client does not know.
    Other(String),
}

impl From<String> for CardColor {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "yellow" => Self::Passive,
            "red" => Self::Instant,
            "green" => Self::Win,
            _ => Self::Other(s),
        }
    }
}

impl From<CardColor> for String {
    fn from(c: CardColor) -> Self {
        match c {
            CardColor::Passive => "yellow".to_string(),
            CardColor::Instant => "red".to_string(),
            CardColor::Win => "green".to_string(),
            CardColor::Other(s) => s,
        }
    }
}

/// Card content shared by deck definitions, inventory rows and market slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    /// Deck.
    #[serde(rename = "type_")]
    pub card_type: CardType,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Rules text.
    #[serde(default)]
    pub description: String,
    /// Market price, for vault cards.
    #[serde(default, deserialize_with = "wire::opt_amount")]
    pub cost: Option<i64>,
    /// Color.
    #[serde(default)]
    pub color: Option<CardColor>,
    /// Machine-readable action keyword.
    #[serde(default)]
    pub action_type: Option<String>,
    /// Parameter of the action.
    #[serde(default, deserialize_with = "wire::opt_amount")]
    pub action_value: Option<i64>,
}

/// A card definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Card id.
    pub id: CardId,
    /// Content.
    #[serde(flatten)]
    pub details: CardDetails,
}

/// A card held by a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantCard {
    /// Inventory row id (used to play or discard the card).
    pub id: InventoryId,
    /// Holder.
    pub participant_id: ParticipantId,
    /// Card definition.
    pub card_id: CardId,
    /// Whether a passive card is currently in effect.
    #[serde(default)]
    pub is_active: bool,
    /// Acquisition time.
    #[serde(default, deserialize_with = "wire::opt_datetime")]
    pub acquired_at: Option<DateTime<Utc>>,
    /// Content.
    #[serde(flatten)]
    pub details: CardDetails,
}

/// A card in another player's inventory, as listed for special actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    /// Holder's user id.
    pub user_id: UserId,
    /// Holder's display name.
    #[serde(default)]
    pub user_name: String,
    /// The held card.
    pub card: ParticipantCard,
}

/// One of the three rotating vault-market slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSlot {
    /// Game the market belongs to.
    pub game_id: GameId,
    /// Slot position, 0..3.
    pub slot_index: u8,
    /// Card on offer.
    pub card_id: CardId,
    /// Content.
    #[serde(flatten)]
    pub details: CardDetails,
}

/// Static property reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Property id.
    pub id: PropertyId,
    /// Display name.
    pub name: String,
    /// Color group (e.g. `"brown"`, `"railroad"`).
    pub group_color: String,
    /// Purchase price.
    #[serde(deserialize_with = "wire::amount")]
    pub price: i64,
    /// Rent with no buildings.
    #[serde(default, deserialize_with = "wire::amount")]
    pub rent_base: i64,
    /// Rent with one house.
    #[serde(default, deserialize_with = "wire::opt_amount")]
    pub rent_house_1: Option<i64>,
    /// Rent with two houses.
    #[serde(default, deserialize_with = "wire::opt_amount")]
    pub rent_house_2: Option<i64>,
    /// Rent with three houses.
    #[serde(default, deserialize_with = "wire::opt_amount")]
    pub rent_house_3: Option<i64>,
    /// Rent with four houses.
    #[serde(default, deserialize_with = "wire::opt_amount")]
    pub rent_house_4: Option<i64>,
    /// Rent with a hotel.
    #[serde(default, deserialize_with = "wire::opt_amount")]
    pub rent_hotel: Option<i64>,
    /// Cash received when mortgaging.
    #[serde(default, deserialize_with = "wire::amount")]
    pub mortgage_value: i64,
    /// Cash paid to lift the mortgage.
    #[serde(default, deserialize_with = "wire::amount")]
    pub unmortgage_cost: i64,
    /// Price of one house.
    #[serde(default, deserialize_with = "wire::opt_amount")]
    pub house_cost: Option<i64>,
    /// Price of a hotel.
    #[serde(default, deserialize_with = "wire::opt_amount")]
    pub hotel_cost: Option<i64>,
    /// Board index, 0..40.
    #[serde(default)]
    pub board_position: Option<i32>,
}

/// Ownership of a property in one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantProperty {
    /// Ownership row id.
    pub id: uuid::Uuid,
    /// Game.
    pub game_id: GameId,
    /// Owner.
    pub participant_id: ParticipantId,
    /// Property owned.
    pub property_id: PropertyId,
    /// Mortgage flag.
    #[serde(default)]
    pub is_mortgaged: bool,
    /// Houses built, 0..=4.
    #[serde(default)]
    pub house_count: u8,
    /// Hotels built, 0..=1.
    #[serde(default)]
    pub hotel_count: u8,
    /// Property name, when the server joins it in.
    #[serde(default)]
    pub property_name: Option<String>,
    /// Color group, when the server joins it in.
    #[serde(default)]
    pub group_color: Option<String>,
}

/// Auction status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuctionStatus {
    /// Accepting bids.
    Active,
    /// Closed.
    Finished,
}

/// A property auction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    /// Auction id.
    pub id: AuctionId,
    /// Game.
    pub game_id: GameId,
    /// Property on the block.
    pub property_id: PropertyId,
    /// Highest bid so far.
    #[serde(default, deserialize_with = "wire::amount")]
    pub current_bid: i64,
    /// User holding the highest bid.
    #[serde(default)]
    pub highest_bidder_id: Option<UserId>,
    /// Status.
    pub status: AuctionStatus,
    /// Start time.
    #[serde(default, deserialize_with = "wire::opt_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    /// Scheduled end.
    #[serde(default, deserialize_with = "wire::opt_datetime")]
    pub ends_at: Option<DateTime<Utc>>,
}

/// Trade status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    /// Awaiting the target's answer.
    Pending,
    /// Accepted and executed.
    Accepted,
    /// Declined by the target.
    Rejected,
    /// Withdrawn or invalidated.
    Cancelled,
}

impl TradeStatus {
    /// Returns `true` once the trade can no longer change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A trade offer between two participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Trade id.
    pub id: TradeId,
    /// Game.
    pub game_id: GameId,
    /// User making the offer.
    pub initiator_id: UserId,
    /// User receiving the offer.
    pub target_id: UserId,
    /// Cash offered.
    #[serde(default, deserialize_with = "wire::amount")]
    pub offer_cash: i64,
    /// Cash requested.
    #[serde(default, deserialize_with = "wire::amount")]
    pub request_cash: i64,
    /// Properties offered.
    #[serde(default, deserialize_with = "wire::id_list")]
    pub offer_properties: Vec<PropertyId>,
    /// Properties requested.
    #[serde(default, deserialize_with = "wire::id_list")]
    pub request_properties: Vec<PropertyId>,
    /// Inventory cards offered.
    #[serde(default, deserialize_with = "wire::id_list")]
    pub offer_cards: Vec<InventoryId>,
    /// Inventory cards requested.
    #[serde(default, deserialize_with = "wire::id_list")]
    pub request_cards: Vec<InventoryId>,
    /// Status.
    pub status: TradeStatus,
    /// Creation time.
    #[serde(default, deserialize_with = "wire::opt_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

/// An authenticated user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// User id.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const GAME: &str = "6f1c2a4e-1111-4c2b-9a7e-000000000001";
    const P1: &str = "6f1c2a4e-2222-4c2b-9a7e-000000000001";
    const P2: &str = "6f1c2a4e-2222-4c2b-9a7e-000000000002";

    #[test]
    fn unknown_game_status_decodes_as_waiting() {
        let Ok(status) = serde_json::from_str::<GameStatus>("\"LOBBY\"") else {
            panic!("status should decode");
        };
        assert_eq!(status, GameStatus::Waiting);
        assert!(GameStatus::Cancelled.is_terminal());
        assert!(!GameStatus::Paused.is_terminal());
    }

    #[test]
    fn transaction_decodes_server_shape() {
        let json = format!(
            r#"{{"id":"{P1}","game_id":"{GAME}","from_participant_id":null,
               "to_participant_id":"{P2}","amount":"200.00","description":"Salida",
               "created_at":"2026-01-04 22:30:58.641961 +00:00"}}"#
        );
        let Ok(tx) = serde_json::from_str::<Transaction>(&json) else {
            panic!("transaction should decode");
        };
        assert_eq!(tx.amount, 200);
        assert!(tx.involves_bank());
        assert!(tx.has_valid_sides());
        assert!(tx.created_at.is_some());
    }

    #[test]
    fn self_transfer_has_invalid_sides() {
        let Ok(p) = P1.parse::<ParticipantId>() else {
            panic!("id should parse");
        };
        let tx = Transaction {
            id: TransactionId::new(),
            game_id: GameId::new(),
            from_participant_id: Some(p),
            to_participant_id: Some(p),
            amount: 10,
            description: None,
            created_at: None,
        };
        assert!(!tx.has_valid_sides());
    }

    #[test]
    fn trade_unwraps_json_wrapped_lists() {
        let json = format!(
            r#"{{"id":"{P1}","game_id":"{GAME}","initiator_id":"{P1}","target_id":"{P2}",
               "offer_cash":100,"request_cash":"0",
               "offer_properties":{{"0":["{P2}"]}},"request_properties":null,
               "status":"PENDING"}}"#
        );
        let Ok(trade) = serde_json::from_str::<Trade>(&json) else {
            panic!("trade should decode");
        };
        assert_eq!(trade.offer_properties.len(), 1);
        assert!(trade.request_properties.is_empty());
        assert!(trade.offer_cards.is_empty());
        assert!(!trade.status.is_terminal());
    }

    #[test]
    fn market_slot_flattens_card_details() {
        let json = format!(
            r#"{{"game_id":"{GAME}","slot_index":2,"card_id":"{P1}","title":"Escudo",
               "description":"Bloquea un pago","cost":"300","color":"yellow","type_":"boveda"}}"#
        );
        let Ok(slot) = serde_json::from_str::<MarketSlot>(&json) else {
            panic!("slot should decode");
        };
        assert_eq!(slot.details.cost, Some(300));
        assert_eq!(slot.details.card_type, CardType::Boveda);
        assert_eq!(slot.details.color, Some(CardColor::Passive));
    }

    #[test]
    fn display_name_falls_back() {
        let participant = Participant {
            id: ParticipantId::new(),
            user_id: UserId::new(),
            game_id: GameId::new(),
            username: Some("ana_g".to_string()),
            first_name: String::new(),
            last_name: String::new(),
            balance: 1500,
            position: 0,
        };
        assert_eq!(participant.display_name(), "ana_g");
    }
}
