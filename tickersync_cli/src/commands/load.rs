//! The `load` subcommand: fetch one snapshot into the warehouse table.

use anyhow::Result;
use clap::Args;
use tickersync_lib::{AppConfig, SinkTargets};

use crate::output::OutputFormat;

#[derive(Args)]
pub struct LoadArgs {
    /// Partition date to stamp instead of today (YYYY-MM-DD)
    #[arg(long)]
    pub ds: Option<String>,
}

pub async fn run(args: &LoadArgs, config: &AppConfig, format: &OutputFormat) -> Result<()> {
    let ds = super::parse_ds(args.ds.as_deref())?;
    let targets = SinkTargets {
        csv: None,
        warehouse: true,
    };
    super::run_pipeline_once(config, targets, ds, format).await
}
