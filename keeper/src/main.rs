//! Withdrawal Keeper
//!
//! Replays a scenario against a withdrawal manager and an in-memory pool on a
//! simulated clock, settling each cycle as soon as its window opens.

mod config;
mod priority_queue;
mod runtime;
mod scenario;

use anyhow::{Context, Result};
use config::Config;
use priority_queue::ActionQueue;
use runtime::{KeeperReport, Runtime};
use scenario::Scenario;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Withdrawal Keeper");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({:#}), using default local config", e);
        Config::default_local()
    });

    let scenario = Scenario::load(&config.scenario_path).unwrap_or_else(|e| {
        log::warn!("Failed to load scenario ({:#}), running with no actions", e);
        Scenario::default()
    });

    log::info!(
        "Cycles every {}s with a {}s window, cooldown {} cycle(s)",
        config.manager.period_frequency,
        config.manager.period_duration,
        config.manager.cooldown_multiplier
    );

    let report = run(&config, scenario)?;

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    println!("{}", json);
    Ok(())
}

/// Drive the simulated clock from 0 to `end_time`
fn run(config: &Config, scenario: Scenario) -> Result<KeeperReport> {
    let mut runtime = Runtime::new(config)?;
    for account in scenario.accounts() {
        runtime.track(account);
    }
    let mut queue: ActionQueue = scenario.actions.into_iter().collect();

    log::info!("Keeper started with {} scripted actions", queue.len());

    let mut now = 0u64;
    loop {
        tick(&mut runtime, &mut queue, now);

        if now >= config.end_time {
            break;
        }
        now = now
            .saturating_add(config.poll_interval_secs)
            .min(config.end_time);
    }

    if !queue.is_empty() {
        log::warn!("{} actions scheduled after end_time were skipped", queue.len());
    }

    Ok(runtime.report(now))
}

/// Run due actions, then settle the current cycle if needed
fn tick(runtime: &mut Runtime, queue: &mut ActionQueue, now: u64) {
    while let Some(action) = queue.pop_due(now) {
        if let Err(e) = runtime.apply(&action, now) {
            log::error!("Action {:?} at {} failed: {:#}", action.kind, now, e);
        }
    }

    if let Err(e) = runtime.auto_process(now) {
        log::error!("Error processing cycle at {}: {:#}", now, e);
    }

    if let Some(next) = queue.next_at() {
        log::debug!("Next action at {}", next);
    }
}
