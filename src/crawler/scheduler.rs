//! Periodic refresh scheduler
//!
//! Runs a refresh once per fixed interval, forever. A failed tick is logged
//! and the loop carries on with the next one.

use crate::config::SchedulerConfig;
use crate::crawler::refresh::{RefreshSummary, Refresher};
use crate::storage::TenderStore;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Drives a `Refresher` on a fixed interval
pub struct Scheduler<S: TenderStore> {
    refresher: Refresher<S>,
    interval: Duration,
    dry_run: bool,
}

impl<S: TenderStore> Scheduler<S> {
    /// Creates a scheduler
    ///
    /// # Arguments
    ///
    /// * `refresher` - The refresh to run on every tick
    /// * `config` - Interval and dry-run mode
    pub fn new(refresher: Refresher<S>, config: &SchedulerConfig) -> Self {
        Self {
            refresher,
            interval: Duration::from_secs(config.interval_secs),
            dry_run: config.dry_run,
        }
    }

    pub fn refresher(&self) -> &Refresher<S> {
        &self.refresher
    }

    /// Runs one refresh, absorbing any error
    ///
    /// # Returns
    ///
    /// * `Some(summary)` - The refresh completed
    /// * `None` - The refresh failed; the error was logged
    pub async fn tick(&self) -> Option<RefreshSummary> {
        match self.refresher.refresh_once(self.dry_run).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::error!("Scheduled refresh failed: {}", e);
                None
            }
        }
    }

    /// Runs forever: one tick immediately, then one per interval
    ///
    /// A tick that overruns the interval delays the next one instead of
    /// triggering a burst of catch-up ticks.
    pub async fn run(&self) {
        tracing::info!(
            "Scheduler started: every {:?}, {}",
            self.interval,
            if self.dry_run { "dry run" } else { "live" }
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if let Some(summary) = self.tick().await {
                tracing::info!(
                    "Tick done: parsed_total={} inserted_new={}",
                    summary.parsed_total,
                    summary.inserted_new
                );
            }
        }
    }
}
