//! Collaborator capabilities the manager calls into
//!
//! The manager never owns these. Each entry point takes the host it needs as a
//! generic `&mut H`, so any combination of real or test implementations can be
//! plugged in.

use crate::error::{LiquidityFailure, TransferFailure};
use crate::types::AccountId;

/// Custodian of the pool share token
pub trait ShareCustodian {
    /// Move `amount` shares from `owner` to `recipient` on the manager's behalf
    fn transfer_shares_from(
        &mut self,
        owner: &AccountId,
        recipient: &AccountId,
        amount: u128,
    ) -> Result<(), TransferFailure>;

    /// Move `amount` shares held by `from` (the manager's custody) to `recipient`
    fn transfer_shares(
        &mut self,
        from: &AccountId,
        recipient: &AccountId,
        amount: u128,
    ) -> Result<(), TransferFailure>;
}

/// Custodian of the settlement asset
pub trait FundsCustodian {
    fn transfer_funds_from(
        &mut self,
        owner: &AccountId,
        recipient: &AccountId,
        amount: u128,
    ) -> Result<(), TransferFailure>;

    fn transfer_funds(
        &mut self,
        from: &AccountId,
        recipient: &AccountId,
        amount: u128,
    ) -> Result<(), TransferFailure>;
}

/// The pool that turns shares back into funds
pub trait LiquiditySource {
    /// Funds the pool can pay out right now
    fn unlocked_balance(&self) -> u128;

    /// Shares equivalent to `funds` at the current exchange rate
    fn preview_withdraw(&self, funds: u128) -> u128;

    /// Burn `shares` held by `owner` and pay the proceeds to `owner`.
    /// Returns the funds actually paid.
    fn redeem(&mut self, owner: &AccountId, shares: u128) -> Result<u128, LiquidityFailure>;
}
