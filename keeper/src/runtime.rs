//! Transactional host for the manager and its in-memory pool
//!
//! Every manager call runs against a snapshot of both sides; a failed call
//! restores the snapshot, so collaborator effects roll back with the ledger.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use serde::Serialize;
use withdrawal_model::{
    AccountId, CallContext, MemoryPool, ProcessedCycle, WithdrawalError, WithdrawalEvent,
    WithdrawalManager,
};

use crate::config::{Config, PoolSeed};
use crate::scenario::{Action, ActionKind};

const KEEPER: &str = "keeper";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountReport {
    pub shares: u128,
    pub funds: u128,
    pub locked_shares: u128,
    pub target_cycle: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeeperReport {
    pub end_time: u64,
    pub processed: Vec<ProcessedCycle>,
    pub failed_calls: usize,
    pub custody: AccountReport,
    pub accounts: BTreeMap<AccountId, AccountReport>,
    pub events: Vec<WithdrawalEvent>,
}

pub struct Runtime {
    manager: WithdrawalManager,
    pool: MemoryPool,
    /// Accounts shown in the report
    accounts: BTreeSet<AccountId>,
    processed: Vec<ProcessedCycle>,
    failed_calls: usize,
}

impl Runtime {
    pub fn new(config: &Config) -> Result<Self> {
        let manager = WithdrawalManager::new(config.manager.clone(), config.custody.as_str())
            .context("Failed to create withdrawal manager")?;
        let pool = seed_pool(&config.initial_pool)?;
        let accounts = config
            .initial_pool
            .deposits
            .iter()
            .map(|deposit| AccountId::from(deposit.account.as_str()))
            .collect();

        Ok(Self {
            manager,
            pool,
            accounts,
            processed: Vec::new(),
            failed_calls: 0,
        })
    }

    pub fn manager(&self) -> &WithdrawalManager {
        &self.manager
    }

    pub fn pool(&self) -> &MemoryPool {
        &self.pool
    }

    pub fn track(&mut self, account: AccountId) {
        self.accounts.insert(account);
    }

    /// Run one manager call; on error both manager and pool are restored
    pub fn call<T>(
        &mut self,
        op: impl FnOnce(&mut WithdrawalManager, &mut MemoryPool) -> Result<T, WithdrawalError>,
    ) -> Result<T, WithdrawalError> {
        let snapshot = (self.manager.clone(), self.pool.clone());
        match op(&mut self.manager, &mut self.pool) {
            Ok(value) => Ok(value),
            Err(e) => {
                (self.manager, self.pool) = snapshot;
                self.failed_calls += 1;
                Err(e)
            }
        }
    }

    /// Execute one scenario action at `now`
    pub fn apply(&mut self, action: &Action, now: u64) -> Result<()> {
        match action.kind {
            ActionKind::Deposit => {
                let account = action.account()?;
                let amount = action.amount()?;
                self.pool.mint_funds(&account, amount);
                let minted = self
                    .pool
                    .deposit(&account, amount)
                    .context(format!("Deposit by {} failed", account))?;
                log::info!("{} deposited {} for {} shares", account, amount, minted);
                self.track(account);
            }
            ActionKind::Lock => {
                let account = action.account()?;
                let amount = action.amount()?;
                let ctx = CallContext::new(account.clone(), now);
                let locked = self.call(|manager, pool| manager.lock_shares(pool, &ctx, amount))?;
                log::info!(
                    "{} locked {} shares, {} queued for cycle {}",
                    account,
                    amount,
                    locked,
                    self.manager.target_cycle(&account)
                );
                self.track(account);
            }
            ActionKind::Unlock => {
                let account = action.account()?;
                let amount = action.amount()?;
                let ctx = CallContext::new(account.clone(), now);
                let remaining = self.call(|manager, pool| manager.unlock_shares(pool, &ctx, amount))?;
                log::info!("{} unlocked {} shares, {} still queued", account, amount, remaining);
                self.track(account);
            }
            ActionKind::Redeem => {
                let account = action.account()?;
                let reclaim = action.amount.map(u128::from).unwrap_or(u128::MAX);
                let ctx = CallContext::new(account.clone(), now);
                let outcome = self.call(|manager, pool| manager.redeem_position(pool, &ctx, reclaim))?;
                log::info!(
                    "{} redeemed {} shares for {} funds, reclaimed {}",
                    account,
                    outcome.redeemed_shares,
                    outcome.funds_withdrawn,
                    outcome.reclaimed_shares
                );
                self.track(account);
            }
            ActionKind::Process => {
                let processed = self.process(now)?;
                log::info!("Cycle {} processed on request", processed.cycle);
            }
            ActionKind::Lend => {
                let amount = action.amount()?;
                self.pool.lend(amount).context("Lend failed")?;
                log::info!("Lent {} out of the pool", amount);
            }
            ActionKind::AddLiquidity => {
                let amount = action.amount()?;
                self.pool.repay(amount);
                log::info!("Returned {} to the pool", amount);
            }
            ActionKind::AccrueYield => {
                let amount = action.amount()?;
                self.pool.accrue_yield(amount);
                log::info!("Pool accrued {} of yield", amount);
            }
        }
        Ok(())
    }

    fn process(&mut self, now: u64) -> Result<ProcessedCycle, WithdrawalError> {
        let ctx = CallContext::new(KEEPER, now);
        let processed = self.call(|manager, pool| manager.process_cycle(pool, &ctx))?;
        self.processed.push(processed);
        Ok(processed)
    }

    /// Settle the current cycle if its window is open and it has shares queued
    pub fn auto_process(&mut self, now: u64) -> Result<Option<ProcessedCycle>> {
        let cycle = self.manager.current_cycle(now);
        let bounds = self.manager.cycle_bounds(cycle)?;
        if !bounds.contains(now)
            || self.manager.is_processed(cycle)
            || self.manager.total_shares(cycle) == 0
        {
            return Ok(None);
        }

        let processed = self.process(now)?;
        log::info!(
            "Settled cycle {}: {} funds, {} leftover shares",
            processed.cycle,
            processed.available_funds,
            processed.leftover_shares
        );
        Ok(Some(processed))
    }

    fn account_report(&self, account: &AccountId) -> AccountReport {
        AccountReport {
            shares: self.pool.share_balance(account),
            funds: self.pool.funds_balance(account),
            locked_shares: self.manager.locked_shares(account),
            target_cycle: self.manager.target_cycle(account),
        }
    }

    pub fn report(&self, end_time: u64) -> KeeperReport {
        KeeperReport {
            end_time,
            processed: self.processed.clone(),
            failed_calls: self.failed_calls,
            custody: self.account_report(self.manager.custody()),
            accounts: self
                .accounts
                .iter()
                .map(|account| (account.clone(), self.account_report(account)))
                .collect(),
            events: self.manager.events().to_vec(),
        }
    }
}

fn seed_pool(seed: &PoolSeed) -> Result<MemoryPool> {
    let mut pool = MemoryPool::new(seed.id.as_str());
    for deposit in &seed.deposits {
        let account = AccountId::from(deposit.account.as_str());
        let amount = u128::from(deposit.amount);
        pool.mint_funds(&account, amount);
        pool.deposit(&account, amount)
            .context(format!("Seed deposit by {} failed", account))?;
    }
    if seed.lent > 0 {
        pool.lend(u128::from(seed.lent)).context("Seed loan failed")?;
    }
    Ok(pool)
}
