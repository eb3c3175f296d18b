//! Card deck, inventory and vault-market endpoints.

use serde::Serialize;

use super::ApiClient;
use crate::domain::{Card, CardType, GameId, InventoryEntry, InventoryId, MarketSlot, ParticipantCard};
use crate::error::ClientError;

/// Number of vault-market slots.
pub const MARKET_SLOTS: u8 = 3;

/// Special action against another player's card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialAction {
    /// Buy the target card from its holder.
    Buy,
    /// Destroy the target card.
    Destroy,
    /// Swap one of the caller's cards for the target card.
    Exchange,
}

#[derive(Serialize)]
struct Draw<'a> {
    card_type: &'a str,
}

#[derive(Serialize)]
struct Slot {
    slot_index: u8,
}

#[derive(Serialize)]
struct UseCard {
    inventory_id: InventoryId,
}

#[derive(Serialize)]
struct SpecialActionBody {
    action: SpecialAction,
    target_inventory_id: InventoryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    my_card_id: Option<InventoryId>,
}

fn check_slot(slot_index: u8) -> Result<Slot, ClientError> {
    if slot_index >= MARKET_SLOTS {
        return Err(ClientError::InvalidRequest(format!(
            "market slot must be below {MARKET_SLOTS}, got {slot_index}"
        )));
    }
    Ok(Slot { slot_index })
}

impl ApiClient {
    /// Draws the top card of a deck (`arca` or `fortuna`).
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn draw_card(&self, game_id: GameId, deck: &CardType) -> Result<Card, ClientError> {
        self.post(
            &format!("games/{game_id}/cards/draw"),
            &Draw {
                card_type: deck.as_str(),
            },
        )
        .await
    }

    /// Lists the three vault-market slots.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn market(&self, game_id: GameId) -> Result<Vec<MarketSlot>, ClientError> {
        self.get(&format!("games/{game_id}/cards/market")).await
    }

    /// Buys the card in a market slot.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] for a slot outside `0..3`, or
    /// the server error (e.g. insufficient funds).
    pub async fn buy_market_card(&self, game_id: GameId, slot_index: u8) -> Result<(), ClientError> {
        let body = check_slot(slot_index)?;
        self.post_unit(&format!("games/{game_id}/cards/market/buy"), Some(&body))
            .await
    }

    /// Replaces the card in a market slot with a new draw.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] for a slot outside `0..3`, or
    /// any transport or server error.
    pub async fn exchange_market_card(&self, game_id: GameId, slot_index: u8) -> Result<Vec<MarketSlot>, ClientError> {
        let body = check_slot(slot_index)?;
        self.post(&format!("games/{game_id}/cards/market/exchange"), &body)
            .await
    }

    /// Lists the caller's cards.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn inventory(&self, game_id: GameId) -> Result<Vec<ParticipantCard>, ClientError> {
        self.get(&format!("games/{game_id}/cards/inventory")).await
    }

    /// Plays a card from the caller's inventory.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn use_card(&self, game_id: GameId, inventory_id: InventoryId) -> Result<(), ClientError> {
        self.post_unit(&format!("games/{game_id}/cards/use"), Some(&UseCard { inventory_id }))
            .await
    }

    /// Discards a card from the caller's inventory.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn discard_card(&self, game_id: GameId, inventory_id: InventoryId) -> Result<(), ClientError> {
        self.delete(&format!("games/{game_id}/cards/inventory/{inventory_id}"))
            .await
    }

    /// Lists every player's cards.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn all_inventories(&self, game_id: GameId) -> Result<Vec<InventoryEntry>, ClientError> {
        self.get(&format!("games/{game_id}/cards/all-inventories")).await
    }

    /// Runs a special action against another player's card.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] if an exchange names no card
    /// of the caller's, or any transport or server error.
    pub async fn special_action(
        &self,
        game_id: GameId,
        action: SpecialAction,
        target_inventory_id: InventoryId,
        my_card_id: Option<InventoryId>,
    ) -> Result<(), ClientError> {
        if action == SpecialAction::Exchange && my_card_id.is_none() {
            return Err(ClientError::InvalidRequest(
                "choose one of your cards to exchange".to_string(),
            ));
        }
        self.post_unit(
            &format!("games/{game_id}/cards/special-action"),
            Some(&SpecialActionBody {
                action,
                target_inventory_id,
                my_card_id,
            }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_bounded() {
        assert!(check_slot(0).is_ok());
        assert!(check_slot(2).is_ok());
        assert!(matches!(check_slot(3), Err(ClientError::InvalidRequest(_))));
    }

    #[test]
    fn special_action_serializes_lowercase() {
        let body = SpecialActionBody {
            action: SpecialAction::Destroy,
            target_inventory_id: InventoryId::new(),
            my_card_id: None,
        };
        let json = serde_json::to_value(&body).ok();
        assert_eq!(
            json.as_ref().and_then(|v| v.get("action")).and_then(|v| v.as_str()),
            Some("destroy")
        );
        assert!(json.as_ref().and_then(|v| v.get("my_card_id")).is_none());
    }
}
