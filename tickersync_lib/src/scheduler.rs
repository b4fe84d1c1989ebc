//! Periodic runner for the snapshot job.
//!
//! Firings are aligned to a fixed grid (`start + n * interval`). Runs never
//! overlap: a firing that comes due while a run is still going is dropped and
//! the next run starts on the next grid point after the current one ends.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::error::TickerSyncError;
use crate::validation;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Counters reported when the scheduler stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    pub runs: usize,
    pub failures: usize,
    /// Firings dropped because a run was still in flight.
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: Duration,
    max_runs: Option<usize>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_runs: None,
        }
    }
}

impl Scheduler {
    pub fn new(interval: Duration) -> Result<Self, TickerSyncError> {
        validation::validate_interval_secs(interval.as_secs())?;
        Ok(Self {
            interval,
            max_runs: None,
        })
    }

    /// Stop after `max_runs` completed runs.
    pub fn with_max_runs(mut self, max_runs: usize) -> Self {
        self.max_runs = Some(max_runs);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs `job` on the grid until Ctrl-C (or `max_runs`).
    pub async fn run<F, Fut, T, E>(&self, job: F) -> SchedulerStats
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        };
        self.run_until(job, shutdown).await
    }

    /// Runs `job` on the grid until `shutdown` resolves (or `max_runs`).
    ///
    /// Shutdown is observed between runs; a run in progress completes first.
    /// A failed run is logged and counted, and the schedule continues.
    pub async fn run_until<F, Fut, T, E, S>(&self, mut job: F, shutdown: S) -> SchedulerStats
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        S: Future<Output = ()>,
    {
        let mut stats = SchedulerStats::default();
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        tracing::info!(
            "Scheduler started (interval={}s)",
            self.interval.as_secs_f64()
        );

        loop {
            let fired_at = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping scheduler");
                    break;
                }
                fired_at = ticker.tick() => fired_at,
            };

            tracing::info!("Job started at {}", Local::now().format(TIMESTAMP_FORMAT));
            let result = job().await;
            let line = finish_line(&result, Local::now());
            match result {
                Ok(_) => tracing::info!("{}", line),
                Err(_) => {
                    stats.failures += 1;
                    tracing::error!("{}", line);
                }
            }
            stats.runs += 1;

            if self.max_runs.is_some_and(|max| stats.runs >= max) {
                tracing::info!("Reached {} run(s), stopping scheduler", stats.runs);
                break;
            }

            let missed = missed_firings(fired_at, Instant::now(), self.interval);
            if missed > 0 {
                tracing::warn!(
                    "Run overran the {}s interval, skipping {} firing(s)",
                    self.interval.as_secs_f64(),
                    missed
                );
                stats.skipped += missed;
            }
        }

        tracing::info!(
            "Scheduler stopped: {} run(s), {} failure(s), {} skipped",
            stats.runs,
            stats.failures,
            stats.skipped
        );
        stats
    }
}

/// Completion log line, written for successful and failed runs alike.
fn finish_line<T, E: fmt::Display>(result: &Result<T, E>, finished_at: DateTime<Local>) -> String {
    let at = finished_at.format(TIMESTAMP_FORMAT);
    match result {
        Ok(_) => format!("Job finished at {}", at),
        Err(e) => format!("Job finished at {} (failed: {})", at, e),
    }
}

/// Grid points strictly after `fired_at` that had passed by `now`.
fn missed_firings(fired_at: Instant, now: Instant, period: Duration) -> usize {
    let elapsed = now.saturating_duration_since(fired_at);
    if period.is_zero() {
        return 0;
    }
    (elapsed.as_nanos() / period.as_nanos()) as usize
}
