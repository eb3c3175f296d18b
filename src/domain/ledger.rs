//! Derived balances over the transaction log, and transfer requests.
//!
//! The server has no bank endpoint: the Bank's reserves are a pure fold of
//! the full transaction log, recomputed whenever the log is refetched.
//! Participant balances stay server-authoritative; [`net_flows`] is a view
//! for history screens, not a replacement.

use std::collections::HashMap;

use serde::Serialize;

use super::entities::Transaction;
use super::ids::ParticipantId;
use crate::error::ClientError;

/// Bank reserves before any transaction.
pub const DEFAULT_INITIAL_BANK_BALANCE: i64 = 20_580;

/// Amount of the one-click "pass Go" payout.
pub const SALARY_AMOUNT: i64 = 200;

/// Computes the Bank balance over the full log.
///
/// `initial - Σ(Bank → player) + Σ(player → Bank)`. Entries with both sides
/// set or both sides `None` do not touch the Bank.
#[must_use]
pub fn bank_balance(initial: i64, transactions: &[Transaction]) -> i64 {
    transactions.iter().fold(initial, |balance, tx| {
        match (tx.from_participant_id, tx.to_participant_id) {
            (None, Some(_)) => balance.saturating_sub(tx.amount),
            (Some(_), None) => balance.saturating_add(tx.amount),
            _ => balance,
        }
    })
}

/// Computes the net cash flow per participant over the log.
///
/// Outgoing amounts count negative, incoming positive. Malformed entries
/// (both sides `None`, or the same participant twice) are skipped.
#[must_use]
pub fn net_flows(transactions: &[Transaction]) -> HashMap<ParticipantId, i64> {
    let mut flows: HashMap<ParticipantId, i64> = HashMap::new();
    for tx in transactions.iter().filter(|tx| tx.has_valid_sides()) {
        if let Some(from) = tx.from_participant_id {
            let entry = flows.entry(from).or_default();
            *entry = entry.saturating_sub(tx.amount);
        }
        if let Some(to) = tx.to_participant_id {
            let entry = flows.entry(to).or_default();
            *entry = entry.saturating_add(tx.amount);
        }
    }
    flows
}

/// Returns the `limit` most recent entries that involve the Bank, newest
/// first. Entries without a timestamp sort last.
#[must_use]
pub fn recent_bank_activity(transactions: &[Transaction], limit: usize) -> Vec<&Transaction> {
    let mut logs: Vec<&Transaction> = transactions.iter().filter(|tx| tx.involves_bank()).collect();
    logs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    logs.truncate(limit);
    logs
}

/// Direction of a transfer initiated by the local participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferKind {
    /// Local participant pays another participant.
    Pay,
    /// Another participant pays the local participant.
    Charge,
    /// Local participant pays the Bank.
    BankPay,
    /// The Bank pays the local participant.
    BankReceive,
}

impl TransferKind {
    /// Dialog title for this transfer.
    #[must_use]
    pub fn title(self, counterparty_name: &str) -> String {
        match self {
            Self::Pay => format!("Pagar a {counterparty_name}"),
            Self::Charge => format!("Cobrar a {counterparty_name}"),
            Self::BankPay => "Pagar al Banco".to_string(),
            Self::BankReceive => "Recibir del Banco".to_string(),
        }
    }
}

/// Body of `POST /games/:id/transactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferRequest {
    /// Payer; `None` is the Bank.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_participant_id: Option<ParticipantId>,
    /// Payee; `None` is the Bank.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_participant_id: Option<ParticipantId>,
    /// Amount, strictly positive.
    pub amount: i64,
    /// Free-text reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TransferRequest {
    /// Builds a transfer from the local participant's point of view.
    ///
    /// `counterparty` is required for [`TransferKind::Pay`] and
    /// [`TransferKind::Charge`] and ignored for the Bank kinds. A blank
    /// description is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidTransfer`] if the amount is not
    /// positive, the counterparty is missing, or it is the local participant.
    pub fn new(
        kind: TransferKind,
        local: ParticipantId,
        counterparty: Option<ParticipantId>,
        amount: i64,
        description: Option<&str>,
    ) -> Result<Self, ClientError> {
        if amount <= 0 {
            return Err(ClientError::InvalidTransfer(
                "amount must be greater than zero".to_string(),
            ));
        }
        let (from, to) = match kind {
            TransferKind::Pay => (Some(local), Some(required(counterparty)?)),
            TransferKind::Charge => (Some(required(counterparty)?), Some(local)),
            TransferKind::BankPay => (Some(local), None),
            TransferKind::BankReceive => (None, Some(local)),
        };
        let request = Self {
            from_participant_id: from,
            to_participant_id: to,
            amount,
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        };
        request.validate()?;
        Ok(request)
    }

    /// The one-click salary payout from the Bank.
    #[must_use]
    pub fn salary(local: ParticipantId) -> Self {
        Self {
            from_participant_id: None,
            to_participant_id: Some(local),
            amount: SALARY_AMOUNT,
            description: Some("Salario".to_string()),
        }
    }

    /// Checks the counterparty invariant: at most one side is the Bank and
    /// the two sides differ.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidTransfer`] describing the violation.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.amount <= 0 {
            return Err(ClientError::InvalidTransfer(
                "amount must be greater than zero".to_string(),
            ));
        }
        match (self.from_participant_id, self.to_participant_id) {
            (None, None) => Err(ClientError::InvalidTransfer(
                "a transfer needs at least one participant".to_string(),
            )),
            (Some(from), Some(to)) if from == to => Err(ClientError::InvalidTransfer(
                "cannot transfer to yourself".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

fn required(counterparty: Option<ParticipantId>) -> Result<ParticipantId, ClientError> {
    counterparty.ok_or_else(|| ClientError::InvalidTransfer("select a player".to_string()))
}
