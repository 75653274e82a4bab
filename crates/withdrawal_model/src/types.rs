//! Shared identifier types

use core::fmt;
use serde::{Deserialize, Serialize};

/// Identity of an account, pool, asset or the manager's own custody account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller identity and injected timestamp for one entry-point call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub caller: AccountId,
    pub now: u64,
}

impl CallContext {
    pub fn new(caller: impl Into<AccountId>, now: u64) -> Self {
        Self {
            caller: caller.into(),
            now,
        }
    }
}
