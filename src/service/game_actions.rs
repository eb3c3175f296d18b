//! Game actions: REST mutations followed by cache invalidation.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::cache::{CacheKey, QueryCache, QueryKind};
use crate::domain::ledger;
use crate::domain::{
    Auction, AuctionId, Card, CardType, DiceRoll, GameId, GameSession, InventoryId, MarketSlot,
    ParticipantProperty, PropertyId, Trade, TradeId, Transaction, TransactionId, TransferRequest,
    UserId,
};
use crate::error::ClientError;
use crate::rest::{ApiClient, GameUpdate, PropertyAction, RollRequest, TradeProposal};

const TRANSFER: &[QueryKind] = &[QueryKind::Transactions, QueryKind::Participants];
const JACKPOT: &[QueryKind] = &[QueryKind::Transactions, QueryKind::Participants, QueryKind::Game];
const ROLL: &[QueryKind] = &[QueryKind::DiceRolls];
const PROPERTY: &[QueryKind] = &[QueryKind::GameProperties, QueryKind::Participants];
const AUCTION_END: &[QueryKind] = &[
    QueryKind::GameProperties,
    QueryKind::Participants,
    QueryKind::ActiveAuction,
];
const TRADE: &[QueryKind] = &[QueryKind::Trades];
const TRADE_ACCEPT: &[QueryKind] = &[
    QueryKind::Trades,
    QueryKind::GameProperties,
    QueryKind::Participants,
];
const CARD: &[QueryKind] = &[
    QueryKind::Inventory,
    QueryKind::Transactions,
    QueryKind::Participants,
];
const MARKET: &[QueryKind] = &[
    QueryKind::BovedaMarket,
    QueryKind::Participants,
    QueryKind::Transactions,
];
const TURN: &[QueryKind] = &[QueryKind::Game, QueryKind::Participants];
const GAME: &[QueryKind] = &[QueryKind::Game];

/// Performs game mutations and keeps the view cache honest.
///
/// Every mutation follows the same pattern: call the server, and only if it
/// succeeded, mark the views it touched stale. Nothing is changed locally
/// ahead of the server's answer. Reads go through the cache.
#[derive(Debug, Clone)]
pub struct GameActions {
    api: Arc<ApiClient>,
    cache: Arc<QueryCache>,
}

impl GameActions {
    /// Creates a new `GameActions`.
    #[must_use]
    pub const fn new(api: Arc<ApiClient>, cache: Arc<QueryCache>) -> Self {
        Self { api, cache }
    }

    /// Returns the inner [`ApiClient`].
    #[must_use]
    pub const fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Returns the inner [`QueryCache`].
    #[must_use]
    pub const fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    async fn settle<T>(
        &self,
        game_id: GameId,
        result: Result<T, ClientError>,
        kinds: &[QueryKind],
    ) -> Result<T, ClientError> {
        match result {
            Ok(value) => {
                self.cache.invalidate_kinds(game_id, kinds).await;
                Ok(value)
            }
            Err(e) => {
                tracing::debug!(%game_id, error = %e, code = e.error_code(), "game action failed");
                Err(e)
            }
        }
    }

    /// Reads a view through the cache, fetching it if missing or stale.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error, or [`ClientError::Json`] if
    /// the body does not decode as `T`.
    pub async fn view<T: DeserializeOwned>(&self, kind: QueryKind, game_id: GameId) -> Result<T, ClientError> {
        let key = CacheKey::new(kind, game_id);
        let api = &self.api;
        self.cache
            .read_through(key, || async move { api.fetch_query(key).await })
            .await
    }

    /// Bank reserves derived from the full transaction log.
    ///
    /// # Errors
    ///
    /// Returns any error from reading the transaction log.
    pub async fn bank_balance(&self, game_id: GameId, initial: i64) -> Result<i64, ClientError> {
        let log: Vec<Transaction> = self.view(QueryKind::Transactions, game_id).await?;
        Ok(ledger::bank_balance(initial, &log))
    }

    /// Creates a transfer.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidTransfer`] before any network call for
    /// an invalid request, otherwise any transport or server error.
    pub async fn transfer(&self, game_id: GameId, request: &TransferRequest) -> Result<Transaction, ClientError> {
        let result = self.api.create_transaction(game_id, request).await;
        self.settle(game_id, result, TRANSFER).await
    }

    /// Reverses a transaction.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn undo_transaction(&self, game_id: GameId, tx_id: TransactionId) -> Result<(), ClientError> {
        let result = self.api.undo_transaction(game_id, tx_id).await;
        self.settle(game_id, result, TRANSFER).await
    }

    /// Claims the jackpot.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn claim_jackpot(&self, game_id: GameId) -> Result<Transaction, ClientError> {
        let result = self.api.claim_jackpot(game_id).await;
        self.settle(game_id, result, JACKPOT).await
    }

    /// Rolls dice.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn roll_dice(&self, game_id: GameId, request: RollRequest) -> Result<DiceRoll, ClientError> {
        let result = self.api.roll_dice(game_id, request).await;
        self.settle(game_id, result, ROLL).await
    }

    /// Buys, mortgages, unmortgages, builds on or sells from a property.
    ///
    /// # Errors
    ///
    /// Returns the server's rule violation or any transport error.
    pub async fn property_action(
        &self,
        game_id: GameId,
        property_id: PropertyId,
        action: PropertyAction,
        user_id: UserId,
    ) -> Result<ParticipantProperty, ClientError> {
        let result = self
            .api
            .property_action(game_id, property_id, action, user_id)
            .await;
        self.settle(game_id, result, PROPERTY).await
    }

    /// Ends an auction.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn end_auction(&self, game_id: GameId, auction_id: AuctionId) -> Result<Auction, ClientError> {
        let result = self.api.end_auction(game_id, auction_id).await;
        self.settle(game_id, result, AUCTION_END).await
    }

    /// Proposes a trade.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] for an invalid proposal, or
    /// any transport or server error.
    pub async fn create_trade(&self, game_id: GameId, proposal: &TradeProposal) -> Result<Trade, ClientError> {
        let result = self.api.create_trade(game_id, proposal).await;
        self.settle(game_id, result, TRADE).await
    }

    /// Accepts a trade.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn accept_trade(&self, game_id: GameId, trade_id: TradeId, user_id: UserId) -> Result<Trade, ClientError> {
        let result = self.api.accept_trade(game_id, trade_id, user_id).await;
        self.settle(game_id, result, TRADE_ACCEPT).await
    }

    /// Rejects a trade.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn reject_trade(&self, game_id: GameId, trade_id: TradeId, user_id: UserId) -> Result<Trade, ClientError> {
        let result = self.api.reject_trade(game_id, trade_id, user_id).await;
        self.settle(game_id, result, TRADE).await
    }

    /// Draws a card.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn draw_card(&self, game_id: GameId, deck: &CardType) -> Result<Card, ClientError> {
        let result = self.api.draw_card(game_id, deck).await;
        self.settle(game_id, result, CARD).await
    }

    /// Plays a card.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn use_card(&self, game_id: GameId, inventory_id: InventoryId) -> Result<(), ClientError> {
        let result = self.api.use_card(game_id, inventory_id).await;
        self.settle(game_id, result, CARD).await
    }

    /// Buys a market card.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] for a bad slot, or any
    /// transport or server error.
    pub async fn buy_market_card(&self, game_id: GameId, slot_index: u8) -> Result<(), ClientError> {
        let result = self.api.buy_market_card(game_id, slot_index).await;
        self.settle(game_id, result, MARKET).await
    }

    /// Replaces a market card.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] for a bad slot, or any
    /// transport or server error.
    pub async fn exchange_market_card(&self, game_id: GameId, slot_index: u8) -> Result<Vec<MarketSlot>, ClientError> {
        let result = self.api.exchange_market_card(game_id, slot_index).await;
        self.settle(game_id, result, MARKET).await
    }

    /// Ends the caller's turn.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn end_turn(&self, game_id: GameId) -> Result<GameSession, ClientError> {
        let result = self.api.end_turn(game_id).await;
        self.settle(game_id, result, TURN).await
    }

    /// Moves a player's token.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn update_position(&self, game_id: GameId, user_id: UserId, position: i32) -> Result<(), ClientError> {
        let result = self.api.update_position(game_id, user_id, position).await;
        self.settle(game_id, result, TURN).await
    }

    /// Updates the game row (name, status, initiative).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] for an empty update, or any
    /// transport or server error.
    pub async fn update_game(&self, game_id: GameId, update: &GameUpdate) -> Result<GameSession, ClientError> {
        let result = self.api.update_game(game_id, update).await;
        self.settle(game_id, result, GAME).await
    }
}
