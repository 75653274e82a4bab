//! Keeper configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use withdrawal_model::ManagerConfig;

/// One funded depositor in the starting pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedDeposit {
    pub account: String,
    pub amount: u64,
}

/// Starting state of the in-memory pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSeed {
    /// Pool account id (also the share token)
    pub id: String,

    /// Deposits made before the scenario starts
    #[serde(default)]
    pub deposits: Vec<SeedDeposit>,

    /// Cash lent out of the pool before the scenario starts
    #[serde(default)]
    pub lent: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Cycle parameters of the withdrawal manager
    pub manager: ManagerConfig,

    /// Custody account of the manager inside the pool
    pub custody: String,

    /// Scenario file (TOML), `~` is expanded
    pub scenario_path: String,

    /// Simulated seconds between keeper ticks
    pub poll_interval_secs: u64,

    /// Simulated time at which the keeper stops
    pub end_time: u64,

    pub initial_pool: PoolSeed,
}

impl Config {
    /// Load configuration from TOML file
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("WITHDRAWAL_KEEPER_CONFIG")
            .unwrap_or_else(|_| "keeper-config.toml".to_string());
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let expanded = shellexpand::tilde(path);
        let config_str = std::fs::read_to_string(expanded.as_ref())
            .context(format!("Failed to read config file: {}", path))?;

        Self::parse(&config_str)
    }

    pub fn parse(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str)
            .context("Failed to parse config TOML")?;

        // Reject bad cycle parameters before the loop starts
        config
            .manager
            .clock()
            .context("Invalid cycle parameters in config")?;
        if config.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be positive");
        }

        Ok(config)
    }

    /// Daily cycles with a one-hour window and a two-cycle cooldown
    pub fn default_local() -> Self {
        Self {
            manager: ManagerConfig {
                pool: "pool".into(),
                asset: "usdc".into(),
                period_start: 0,
                period_duration: 3_600,
                period_frequency: 86_400,
                cooldown_multiplier: 2,
            },
            custody: "withdrawal-manager".to_string(),
            scenario_path: "scenario.toml".to_string(),
            poll_interval_secs: 600,
            end_time: 7 * 86_400,
            initial_pool: PoolSeed {
                id: "pool".to_string(),
                deposits: Vec::new(),
                lent: 0,
            },
        }
    }

    /// Write default config to file
    pub fn write_default(path: &str) -> Result<()> {
        let config = Self::default_local();
        let toml_str = toml::to_string_pretty(&config)
            .context("Failed to serialize config")?;

        std::fs::write(path, toml_str)
            .context(format!("Failed to write config to {}", path))?;

        log::info!("Created default config at {}", path);
        Ok(())
    }
}
