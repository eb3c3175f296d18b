//! Game session endpoints: lifecycle, participants, turns.

use std::collections::HashMap;

use serde::Serialize;

use super::ApiClient;
use crate::domain::{GameId, GameSession, GameStatus, Participant, UserId};
use crate::error::ClientError;

/// Body of `PUT /games/:id`. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GameUpdate {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<GameStatus>,
    /// Initiative roll per user, used by the server to set turn order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiative_rolls: Option<HashMap<UserId, i32>>,
}

#[derive(Serialize)]
struct JoinByCode<'a> {
    code: &'a str,
}

#[derive(Serialize)]
struct PositionUpdate {
    user_id: UserId,
    position: i32,
}

impl ApiClient {
    /// Creates a game hosted by the current user.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn create_game(&self) -> Result<GameSession, ClientError> {
        self.post_empty("games").await
    }

    /// Joins a game by its share code.
    ///
    /// # Errors
    ///
    /// Returns the server error for an unknown code or a full game.
    pub async fn join_game_by_code(&self, code: &str) -> Result<Participant, ClientError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ClientError::InvalidRequest("enter a game code".to_string()));
        }
        self.post("games/join", &JoinByCode { code }).await
    }

    /// Joins a game by id.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn join_game(&self, game_id: GameId) -> Result<Participant, ClientError> {
        self.post_empty(&format!("games/{game_id}/join")).await
    }

    /// Fetches a game session.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn game(&self, game_id: GameId) -> Result<GameSession, ClientError> {
        self.get(&format!("games/{game_id}")).await
    }

    /// Updates name, status or initiative rolls.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] for an empty update, or any
    /// transport or server error.
    pub async fn update_game(&self, game_id: GameId, update: &GameUpdate) -> Result<GameSession, ClientError> {
        if update.name.is_none() && update.status.is_none() && update.initiative_rolls.is_none() {
            return Err(ClientError::InvalidRequest("nothing to update".to_string()));
        }
        self.put(&format!("games/{game_id}"), update).await
    }

    /// Deletes a game (host only).
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn delete_game(&self, game_id: GameId) -> Result<(), ClientError> {
        self.delete(&format!("games/{game_id}")).await
    }

    /// Leaves a game.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn leave_game(&self, game_id: GameId) -> Result<(), ClientError> {
        self.post_unit::<()>(&format!("games/{game_id}/leave"), None).await
    }

    /// Ends the current turn.
    ///
    /// # Errors
    ///
    /// Returns the server error if it is not the caller's turn.
    pub async fn end_turn(&self, game_id: GameId) -> Result<GameSession, ClientError> {
        self.post_empty(&format!("games/{game_id}/end-turn")).await
    }

    /// Lists participants with balances and positions.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn participants(&self, game_id: GameId) -> Result<Vec<Participant>, ClientError> {
        self.get(&format!("games/{game_id}/participants")).await
    }

    /// Moves a player's token. Positions wrap onto the board.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn update_position(&self, game_id: GameId, user_id: UserId, position: i32) -> Result<(), ClientError> {
        let position = position.rem_euclid(crate::domain::board::BOARD_SIZE);
        self.put_unit(
            &format!("games/{game_id}/participants"),
            &PositionUpdate { user_id, position },
        )
        .await
    }
}
