//! In-memory pool host
//!
//! `MemoryPool` plays every collaborator at once: it is the share token, it
//! holds the settlement asset ledger, and it is the liquidity source. Its
//! unlocked balance is the pool's own cash; lending moves cash out without
//! changing total assets, so it lowers liquidity but not the exchange rate.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::{LiquidityFailure, TransferFailure};
use crate::math::mul_div_floor;
use crate::interfaces::{FundsCustodian, LiquiditySource, ShareCustodian};
use crate::types::AccountId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryPool {
    id: AccountId,
    shares: BTreeMap<AccountId, u128>,
    funds: BTreeMap<AccountId, u128>,
    total_supply: u128,
    total_assets: u128,
    frozen: BTreeSet<AccountId>,
}

fn debit(
    ledger: &mut BTreeMap<AccountId, u128>,
    from: &AccountId,
    to: &AccountId,
    amount: u128,
) -> Result<(), TransferFailure> {
    let balance = ledger.get(from).copied().unwrap_or(0);
    if balance < amount {
        return Err(TransferFailure {
            from: from.clone(),
            to: to.clone(),
            amount,
            reason: format!("insufficient balance {}", balance),
        });
    }
    if from == to {
        return Ok(());
    }

    let credited = ledger.get(to).copied().unwrap_or(0);
    let credited = credited.checked_add(amount).ok_or_else(|| TransferFailure {
        from: from.clone(),
        to: to.clone(),
        amount,
        reason: "recipient balance overflow".into(),
    })?;
    ledger.insert(from.clone(), balance - amount);
    ledger.insert(to.clone(), credited);
    Ok(())
}

impl MemoryPool {
    pub fn new(id: impl Into<AccountId>) -> Self {
        Self {
            id: id.into(),
            shares: BTreeMap::new(),
            funds: BTreeMap::new(),
            total_supply: 0,
            total_assets: 0,
            frozen: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn share_balance(&self, account: &AccountId) -> u128 {
        self.shares.get(account).copied().unwrap_or(0)
    }

    pub fn funds_balance(&self, account: &AccountId) -> u128 {
        self.funds.get(account).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn total_assets(&self) -> u128 {
        self.total_assets
    }

    /// Funds value of `shares` at the current rate (floor). `None` if the
    /// value does not fit in u128.
    pub fn convert_to_assets(&self, shares: u128) -> Option<u128> {
        if self.total_supply == 0 {
            return Some(shares);
        }
        mul_div_floor(shares, self.total_assets, self.total_supply).ok()
    }

    /// Credit settlement asset to an account from outside the system
    pub fn mint_funds(&mut self, account: &AccountId, amount: u128) {
        let balance = self.funds_balance(account);
        self.funds.insert(account.clone(), balance.saturating_add(amount));
    }

    /// Deposit funds for freshly minted shares. Returns the shares minted.
    pub fn deposit(&mut self, account: &AccountId, amount: u128) -> Result<u128, TransferFailure> {
        let id = self.id.clone();
        self.ensure_unfrozen(account, &id, amount)?;
        let overflow = |reason: &str| TransferFailure {
            from: account.clone(),
            to: id.clone(),
            amount,
            reason: reason.to_string(),
        };

        let minted = if self.total_supply == 0 || self.total_assets == 0 {
            amount
        } else {
            mul_div_floor(amount, self.total_supply, self.total_assets)
                .map_err(|_| overflow("minted shares overflow"))?
        };
        let balance = self
            .share_balance(account)
            .checked_add(minted)
            .ok_or_else(|| overflow("share balance overflow"))?;
        let total_supply = self
            .total_supply
            .checked_add(minted)
            .ok_or_else(|| overflow("total supply overflow"))?;
        let total_assets = self
            .total_assets
            .checked_add(amount)
            .ok_or_else(|| overflow("total assets overflow"))?;
        debit(&mut self.funds, account, &id, amount)?;

        self.shares.insert(account.clone(), balance);
        self.total_supply = total_supply;
        self.total_assets = total_assets;
        Ok(minted)
    }

    /// Move pool cash out to borrowers. Total assets are unchanged.
    pub fn lend(&mut self, amount: u128) -> Result<(), TransferFailure> {
        let cash = self.unlocked_balance();
        if cash < amount {
            return Err(TransferFailure {
                from: self.id.clone(),
                to: AccountId::from("borrowers"),
                amount,
                reason: format!("pool cash {} below loan", cash),
            });
        }
        self.funds.insert(self.id.clone(), cash - amount);
        Ok(())
    }

    /// Loan principal returns to pool cash
    pub fn repay(&mut self, amount: u128) {
        let id = self.id.clone();
        self.mint_funds(&id, amount);
    }

    /// Interest paid into the pool raises both cash and the exchange rate
    pub fn accrue_yield(&mut self, amount: u128) {
        self.repay(amount);
        self.total_assets = self.total_assets.saturating_add(amount);
    }

    /// Make every transfer touching `account` fail
    pub fn freeze(&mut self, account: &AccountId) {
        self.frozen.insert(account.clone());
    }

    pub fn unfreeze(&mut self, account: &AccountId) {
        self.frozen.remove(account);
    }

    fn ensure_unfrozen(&self, from: &AccountId, to: &AccountId, amount: u128) -> Result<(), TransferFailure> {
        for account in [from, to] {
            if self.frozen.contains(account) {
                return Err(TransferFailure {
                    from: from.clone(),
                    to: to.clone(),
                    amount,
                    reason: format!("account {} is frozen", account),
                });
            }
        }
        Ok(())
    }
}

impl ShareCustodian for MemoryPool {
    fn transfer_shares_from(
        &mut self,
        owner: &AccountId,
        recipient: &AccountId,
        amount: u128,
    ) -> Result<(), TransferFailure> {
        self.ensure_unfrozen(owner, recipient, amount)?;
        debit(&mut self.shares, owner, recipient, amount)
    }

    fn transfer_shares(
        &mut self,
        from: &AccountId,
        recipient: &AccountId,
        amount: u128,
    ) -> Result<(), TransferFailure> {
        self.ensure_unfrozen(from, recipient, amount)?;
        debit(&mut self.shares, from, recipient, amount)
    }
}

impl FundsCustodian for MemoryPool {
    fn transfer_funds_from(
        &mut self,
        owner: &AccountId,
        recipient: &AccountId,
        amount: u128,
    ) -> Result<(), TransferFailure> {
        self.ensure_unfrozen(owner, recipient, amount)?;
        debit(&mut self.funds, owner, recipient, amount)
    }

    fn transfer_funds(
        &mut self,
        from: &AccountId,
        recipient: &AccountId,
        amount: u128,
    ) -> Result<(), TransferFailure> {
        self.ensure_unfrozen(from, recipient, amount)?;
        debit(&mut self.funds, from, recipient, amount)
    }
}

impl LiquiditySource for MemoryPool {
    fn unlocked_balance(&self) -> u128 {
        self.funds_balance(&self.id)
    }

    fn preview_withdraw(&self, funds: u128) -> u128 {
        if self.total_supply == 0 || self.total_assets == 0 {
            return 0;
        }
        // A quote past u128 caps at MAX; callers bound it by the shares they hold
        mul_div_floor(funds, self.total_supply, self.total_assets).unwrap_or(u128::MAX)
    }

    fn redeem(&mut self, owner: &AccountId, shares: u128) -> Result<u128, LiquidityFailure> {
        if self.frozen.contains(owner) {
            return Err(LiquidityFailure {
                shares,
                reason: format!("owner {} is frozen", owner),
            });
        }
        let held = self.share_balance(owner);
        if held < shares {
            return Err(LiquidityFailure {
                shares,
                reason: format!("owner holds only {} shares", held),
            });
        }
        let payout = self.convert_to_assets(shares).ok_or_else(|| LiquidityFailure {
            shares,
            reason: "payout overflows".into(),
        })?;
        let cash = self.unlocked_balance();
        if payout > cash {
            return Err(LiquidityFailure {
                shares,
                reason: format!("payout {} exceeds unlocked cash {}", payout, cash),
            });
        }

        self.shares.insert(owner.clone(), held - shares);
        self.total_supply -= shares;
        self.total_assets = self.total_assets.saturating_sub(payout);
        self.funds.insert(self.id.clone(), cash - payout);
        let balance = self.funds_balance(owner);
        self.funds.insert(owner.clone(), balance.saturating_add(payout));
        Ok(payout)
    }
}
