//! Scripted actions replayed by the keeper

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use withdrawal_model::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Mint funds to the account and deposit them into the pool
    Deposit,
    Lock,
    Unlock,
    /// `amount` is the leftover to take back; omitted means all of it
    Redeem,
    /// Explicit `process_cycle` call, on top of the keeper's own
    Process,
    /// Move pool cash out to borrowers
    Lend,
    /// Return cash to the pool
    AddLiquidity,
    AccrueYield,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("action {kind:?} at {at} needs an account")]
    MissingAccount { kind: ActionKind, at: u64 },
    #[error("action {kind:?} at {at} needs an amount")]
    MissingAmount { kind: ActionKind, at: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Simulated time at which the action runs
    pub at: u64,
    pub kind: ActionKind,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub amount: Option<u64>,
}

impl Action {
    pub fn account(&self) -> Result<AccountId, ScenarioError> {
        self.account
            .as_deref()
            .map(AccountId::from)
            .ok_or(ScenarioError::MissingAccount { kind: self.kind, at: self.at })
    }

    pub fn amount(&self) -> Result<u128, ScenarioError> {
        self.amount
            .map(u128::from)
            .ok_or(ScenarioError::MissingAmount { kind: self.kind, at: self.at })
    }

    /// Account and amount are checked up front so a bad file fails at load
    fn validate(&self) -> Result<(), ScenarioError> {
        match self.kind {
            ActionKind::Deposit | ActionKind::Lock | ActionKind::Unlock => {
                self.account()?;
                self.amount()?;
            }
            ActionKind::Redeem => {
                self.account()?;
            }
            ActionKind::Lend | ActionKind::AddLiquidity | ActionKind::AccrueYield => {
                self.amount()?;
            }
            ActionKind::Process => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default, rename = "action")]
    pub actions: Vec<Action>,
}

impl Scenario {
    pub fn load(path: &str) -> Result<Self> {
        let expanded = shellexpand::tilde(path);
        let scenario_str = std::fs::read_to_string(expanded.as_ref())
            .context(format!("Failed to read scenario file: {}", path))?;

        Self::parse(&scenario_str)
    }

    pub fn parse(scenario_str: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(scenario_str)
            .context("Failed to parse scenario TOML")?;

        for action in &scenario.actions {
            action.validate()?;
        }

        Ok(scenario)
    }

    /// Accounts named anywhere in the scenario
    pub fn accounts(&self) -> impl Iterator<Item = AccountId> + '_ {
        self.actions
            .iter()
            .filter_map(|action| action.account.as_deref().map(AccountId::from))
    }
}
