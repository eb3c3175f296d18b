//! Money and randomness endpoints: transactions, jackpot, dice, roulette,
//! special dice.

use serde::Serialize;

use super::ApiClient;
use crate::domain::{
    DiceHistoryItem, DiceRoll, GameId, RouletteSpin, SpecialDiceRoll, Transaction, TransactionId,
    TransferRequest, UserId,
};
use crate::error::ClientError;

/// Body of `POST /games/:id/roll`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RollRequest {
    /// Faces per die.
    pub sides: u32,
    /// Number of dice.
    pub count: u32,
    /// Let the server pay the salary when the roll passes Go.
    pub auto_salary: bool,
}

impl Default for RollRequest {
    fn default() -> Self {
        Self {
            sides: 6,
            count: 2,
            auto_salary: false,
        }
    }
}

/// Body of `POST /games/:id/roulette`.
#[derive(Debug, Clone, Serialize)]
pub struct RouletteRecord {
    /// Spinner.
    pub user_id: UserId,
    /// Landed segment label.
    pub result_label: String,
    /// Landed segment value.
    pub result_value: i32,
    /// Segment kind (`"red"` or `"green"`).
    pub result_type: String,
}

/// Body of `POST /games/:id/special-dice`.
#[derive(Debug, Clone, Serialize)]
pub struct SpecialDiceRecord {
    /// Roller.
    pub user_id: UserId,
    /// Die display name.
    pub die_name: String,
    /// Die identifier.
    pub die_id: String,
    /// Face shown.
    pub face_label: String,
    /// Face value, if numeric.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_value: Option<i32>,
    /// Face action keyword, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_action: Option<String>,
}

impl ApiClient {
    /// Lists the game's transaction log.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn transactions(&self, game_id: GameId) -> Result<Vec<Transaction>, ClientError> {
        self.get(&format!("games/{game_id}/transactions")).await
    }

    /// Records a transfer. The request is validated before sending.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidTransfer`] without a network call if
    /// the request breaks the counterparty rules, otherwise any transport or
    /// server error (e.g. insufficient funds).
    pub async fn create_transaction(
        &self,
        game_id: GameId,
        request: &TransferRequest,
    ) -> Result<Transaction, ClientError> {
        request.validate()?;
        self.post(&format!("games/{game_id}/transactions"), request).await
    }

    /// Reverses a transaction on the server.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn undo_transaction(&self, game_id: GameId, tx_id: TransactionId) -> Result<(), ClientError> {
        self.delete(&format!("games/{game_id}/transactions/{tx_id}")).await
    }

    /// Claims the free-parking jackpot for the caller.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn claim_jackpot(&self, game_id: GameId) -> Result<Transaction, ClientError> {
        self.post_empty(&format!("games/{game_id}/jackpot/claim")).await
    }

    /// Rolls dice on the server.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] for zero dice or faces, or
    /// any transport or server error.
    pub async fn roll_dice(&self, game_id: GameId, request: RollRequest) -> Result<DiceRoll, ClientError> {
        if request.sides == 0 || request.count == 0 {
            return Err(ClientError::InvalidRequest(
                "dice need at least one face and one die".to_string(),
            ));
        }
        self.post(&format!("games/{game_id}/roll"), &request).await
    }

    /// Lists past rolls with roller names.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn dice_history(&self, game_id: GameId) -> Result<Vec<DiceHistoryItem>, ClientError> {
        self.get(&format!("games/{game_id}/rolls")).await
    }

    /// Lists past roulette spins.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn roulette_history(&self, game_id: GameId) -> Result<Vec<RouletteSpin>, ClientError> {
        self.get(&format!("games/{game_id}/roulette")).await
    }

    /// Records a roulette spin.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn record_roulette(&self, game_id: GameId, record: &RouletteRecord) -> Result<RouletteSpin, ClientError> {
        self.post(&format!("games/{game_id}/roulette"), record).await
    }

    /// Lists past special-dice rolls.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn special_dice_history(&self, game_id: GameId) -> Result<Vec<SpecialDiceRoll>, ClientError> {
        self.get(&format!("games/{game_id}/special-dice")).await
    }

    /// Records a special-dice roll.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn record_special_dice(
        &self,
        game_id: GameId,
        record: &SpecialDiceRecord,
    ) -> Result<SpecialDiceRoll, ClientError> {
        self.post(&format!("games/{game_id}/special-dice"), record).await
    }
}
