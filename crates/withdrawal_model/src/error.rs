//! Error kinds for the withdrawal manager
//!
//! Every variant aborts the call that produced it. The manager never retries;
//! callers re-submit once the triggering condition is resolved.

use thiserror::Error;

use crate::types::AccountId;

/// A custodian refused or could not complete a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transfer of {amount} from {from} to {to} failed: {reason}")]
pub struct TransferFailure {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: u128,
    pub reason: String,
}

/// The liquidity source rejected a redemption.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("liquidity source rejected redeem of {shares} shares: {reason}")]
pub struct LiquidityFailure {
    pub shares: u128,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WithdrawalError {
    /// Construction parameters are invalid
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("amount must be nonzero")]
    ZeroAmount,

    #[error(transparent)]
    Transfer(#[from] TransferFailure),

    /// The request's target cycle has already opened; it must be redeemed
    #[error("withdrawal due: target cycle {cycle} has opened (current cycle {current})")]
    WithdrawDue { cycle: u64, current: u64 },

    #[error("account has no pending withdrawal request")]
    NoRequest,

    #[error("withdrawal window opens at {opens_at}, now is {now}")]
    EarlyWithdraw { opens_at: u64, now: u64 },

    #[error("cycle {cycle} has already been processed")]
    DoubleProcess { cycle: u64 },

    /// Settlement attempted before the cycle's window opened
    #[error("cycle {cycle} opens at {opens_at}, now is {now}")]
    CycleNotOpen { cycle: u64, opens_at: u64, now: u64 },

    #[error("cannot unlock {requested} shares, only {locked} locked")]
    InsufficientShares { requested: u128, locked: u128 },

    #[error(transparent)]
    Liquidity(#[from] LiquidityFailure),

    #[error("arithmetic overflow")]
    Overflow,
}

pub type Result<T, E = WithdrawalError> = core::result::Result<T, E>;
