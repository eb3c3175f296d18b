//! Property, auction and trade endpoints.

use serde::Serialize;

use super::ApiClient;
use crate::domain::{
    Auction, AuctionId, GameId, InventoryId, ParticipantProperty, Property, PropertyId, Trade,
    TradeId, UserId,
};
use crate::error::ClientError;

/// Action on an owned (or buyable) property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyAction {
    /// Buy from the Bank at list price.
    Buy,
    /// Mortgage for cash.
    Mortgage,
    /// Lift a mortgage.
    Unmortgage,
    /// Add a house, or a hotel at four houses.
    Build,
    /// Sell the top building back at half price.
    SellBuilding,
}

impl PropertyAction {
    /// Path segment of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Mortgage => "mortgage",
            Self::Unmortgage => "unmortgage",
            Self::Build => "build",
            Self::SellBuilding => "sell-building",
        }
    }
}

/// Body of `POST /games/:id/trades`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TradeProposal {
    /// Proposing user.
    pub initiator_id: Option<UserId>,
    /// Receiving user.
    pub target_id: Option<UserId>,
    /// Cash offered.
    pub offer_cash: i64,
    /// Properties offered.
    pub offer_properties: Vec<PropertyId>,
    /// Inventory cards offered.
    pub offer_cards: Vec<InventoryId>,
    /// Cash requested.
    pub request_cash: i64,
    /// Properties requested.
    pub request_properties: Vec<PropertyId>,
    /// Inventory cards requested.
    pub request_cards: Vec<InventoryId>,
}

impl TradeProposal {
    /// Checks the proposal before sending.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] if a side is missing, the
    /// parties are the same user, cash is negative, or nothing is exchanged.
    pub fn validate(&self) -> Result<(), ClientError> {
        let (Some(initiator), Some(target)) = (self.initiator_id, self.target_id) else {
            return Err(ClientError::InvalidRequest("select a player to trade with".to_string()));
        };
        if initiator == target {
            return Err(ClientError::InvalidRequest("cannot trade with yourself".to_string()));
        }
        if self.offer_cash < 0 || self.request_cash < 0 {
            return Err(ClientError::InvalidRequest("cash amounts cannot be negative".to_string()));
        }
        let empty = self.offer_cash == 0
            && self.request_cash == 0
            && self.offer_properties.is_empty()
            && self.request_properties.is_empty()
            && self.offer_cards.is_empty()
            && self.request_cards.is_empty();
        if empty {
            return Err(ClientError::InvalidRequest("the trade is empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ActingUser {
    user_id: UserId,
}

#[derive(Serialize)]
struct StartAuction {
    property_id: PropertyId,
}

#[derive(Serialize)]
struct Bid {
    bidder_user_id: UserId,
    amount: i64,
}

impl ApiClient {
    /// Lists the static property catalog.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn properties(&self) -> Result<Vec<Property>, ClientError> {
        self.get("properties").await
    }

    /// Lists ownership rows for a game.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn game_properties(&self, game_id: GameId) -> Result<Vec<ParticipantProperty>, ClientError> {
        self.get(&format!("games/{game_id}/properties")).await
    }

    /// Performs a property action on behalf of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns the server's rule violation (e.g. `"Already mortgaged"`) or
    /// any transport error.
    pub async fn property_action(
        &self,
        game_id: GameId,
        property_id: PropertyId,
        action: PropertyAction,
        user_id: UserId,
    ) -> Result<ParticipantProperty, ClientError> {
        self.post(
            &format!("games/{game_id}/properties/{property_id}/{}", action.as_str()),
            &ActingUser { user_id },
        )
        .await
    }

    /// Returns the game's active auction, if any.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn active_auction(&self, game_id: GameId) -> Result<Option<Auction>, ClientError> {
        self.get(&format!("games/{game_id}/auctions")).await
    }

    /// Puts a property up for auction.
    ///
    /// # Errors
    ///
    /// Returns the server error if an auction is already running.
    pub async fn start_auction(&self, game_id: GameId, property_id: PropertyId) -> Result<Auction, ClientError> {
        self.post(&format!("games/{game_id}/auctions"), &StartAuction { property_id })
            .await
    }

    /// Places a bid.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] for a non-positive bid, or the
    /// server error for a bid below the current one.
    pub async fn place_bid(
        &self,
        game_id: GameId,
        auction_id: AuctionId,
        bidder_user_id: UserId,
        amount: i64,
    ) -> Result<Auction, ClientError> {
        if amount <= 0 {
            return Err(ClientError::InvalidRequest("bid must be greater than zero".to_string()));
        }
        self.post(
            &format!("games/{game_id}/auctions/{auction_id}/bid"),
            &Bid { bidder_user_id, amount },
        )
        .await
    }

    /// Closes an auction and settles it.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn end_auction(&self, game_id: GameId, auction_id: AuctionId) -> Result<Auction, ClientError> {
        self.post_empty(&format!("games/{game_id}/auctions/{auction_id}/end"))
            .await
    }

    /// Lists open trades.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn trades(&self, game_id: GameId) -> Result<Vec<Trade>, ClientError> {
        self.get(&format!("games/{game_id}/trades")).await
    }

    /// Proposes a trade. The proposal is validated before sending.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] without a network call for an
    /// invalid proposal, otherwise any transport or server error.
    pub async fn create_trade(&self, game_id: GameId, proposal: &TradeProposal) -> Result<Trade, ClientError> {
        proposal.validate()?;
        self.post(&format!("games/{game_id}/trades"), proposal).await
    }

    /// Accepts a trade as `user_id`.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn accept_trade(&self, game_id: GameId, trade_id: TradeId, user_id: UserId) -> Result<Trade, ClientError> {
        self.post(&format!("games/{game_id}/trades/{trade_id}/accept"), &ActingUser { user_id })
            .await
    }

    /// Rejects a trade as `user_id`.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn reject_trade(&self, game_id: GameId, trade_id: TradeId, user_id: UserId) -> Result<Trade, ClientError> {
        self.post(&format!("games/{game_id}/trades/{trade_id}/reject"), &ActingUser { user_id })
            .await
    }
}
