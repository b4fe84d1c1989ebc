//! The `schedule` subcommand: repeat the snapshot run on a fixed interval
//! until interrupted.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tickersync_lib::{validation, AppConfig, Pipeline, Scheduler};

use crate::output::{print_run_summary, print_schedule_stats, OutputFormat};

#[derive(Args)]
pub struct ScheduleArgs {
    /// Write each snapshot to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Omit the ds partition column from the CSV
    #[arg(long)]
    pub no_partition: bool,

    /// Load each snapshot into the warehouse table
    #[arg(long)]
    pub warehouse: bool,

    /// Seconds between run starts
    #[arg(long, default_value = "60")]
    pub interval_secs: u64,

    /// Stop after this many runs
    #[arg(long)]
    pub max_runs: Option<usize>,
}

pub async fn run(args: &ScheduleArgs, config: &AppConfig, format: &OutputFormat) -> Result<()> {
    let interval_secs = validation::validate_interval_secs(args.interval_secs)?;
    let targets = super::run::targets(args.csv.as_ref(), args.no_partition, args.warehouse)?;
    let pipeline = Pipeline::new(config, targets, None)?;

    let mut scheduler = Scheduler::new(Duration::from_secs(interval_secs))?;
    if let Some(max_runs) = args.max_runs {
        scheduler = scheduler.with_max_runs(max_runs);
    }

    let pipeline = &pipeline;
    let stats = scheduler
        .run(move || async move {
            let summary = pipeline.run_once().await;
            if let Err(e) = print_run_summary(&summary, format) {
                tracing::warn!("Failed to print run summary: {}", e);
            }
            if summary.is_success() {
                Ok(())
            } else {
                Err(summary.failures().join("; "))
            }
        })
        .await;

    print_schedule_stats(&stats, format)?;
    Ok(())
}
