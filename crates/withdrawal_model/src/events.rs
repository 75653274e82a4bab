//! Observable events emitted by the manager

use serde::{Deserialize, Serialize};

use crate::types::AccountId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WithdrawalEvent {
    /// Shares moved into custody (amount added by this call)
    SharesLocked { account: AccountId, shares: u128 },
    /// Shares returned to the account, by unlock or as reclaimed leftover
    SharesUnlocked { account: AccountId, shares: u128 },
    WithdrawalPending { account: AccountId, cycle: u64 },
    WithdrawalCancelled { account: AccountId },
    FundsWithdrawn { account: AccountId, funds: u128 },
    CycleProcessed { cycle: u64, funds: u128, leftover: u128 },
}

/// Events buffered for the call in progress
#[derive(Debug, Default)]
pub(crate) struct EventBuffer {
    events: Vec<WithdrawalEvent>,
}

impl EventBuffer {
    pub(crate) fn emit(&mut self, event: WithdrawalEvent) {
        log::debug!("event: {:?}", event);
        self.events.push(event);
    }

    pub(crate) fn into_inner(self) -> Vec<WithdrawalEvent> {
        self.events
    }
}
