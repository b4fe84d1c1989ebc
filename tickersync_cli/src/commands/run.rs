//! The `run` subcommand: one snapshot to any combination of sinks.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use tickersync_lib::{AppConfig, CsvTarget, SinkTargets};

use crate::output::OutputFormat;

#[derive(Args)]
pub struct RunArgs {
    /// Also write the snapshot to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Omit the ds partition column from the CSV
    #[arg(long)]
    pub no_partition: bool,

    /// Also load the snapshot into the warehouse table
    #[arg(long)]
    pub warehouse: bool,

    /// Partition date to stamp instead of today (YYYY-MM-DD)
    #[arg(long)]
    pub ds: Option<String>,
}

/// Sink selection shared by `run` and `schedule`.
pub(crate) fn targets(csv: Option<&PathBuf>, no_partition: bool, warehouse: bool) -> Result<SinkTargets> {
    let targets = SinkTargets {
        csv: csv.map(|path| CsvTarget {
            path: path.clone(),
            include_partition: !no_partition,
        }),
        warehouse,
    };
    if targets.is_empty() {
        bail!("no sink selected: pass --csv <PATH> and/or --warehouse");
    }
    Ok(targets)
}

pub async fn run(args: &RunArgs, config: &AppConfig, format: &OutputFormat) -> Result<()> {
    let ds = super::parse_ds(args.ds.as_deref())?;
    let targets = targets(args.csv.as_ref(), args.no_partition, args.warehouse)?;
    super::run_pipeline_once(config, targets, ds, format).await
}
