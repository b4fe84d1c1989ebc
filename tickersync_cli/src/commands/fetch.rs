//! The `fetch` subcommand: write one snapshot to a CSV file.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tickersync_lib::{AppConfig, CsvTarget, SinkTargets};

use crate::output::OutputFormat;

#[derive(Args)]
pub struct FetchArgs {
    /// Destination CSV file (overwritten)
    #[arg(long, default_value = "tickers.csv")]
    pub out: PathBuf,

    /// Omit the ds partition column from the CSV
    #[arg(long)]
    pub no_partition: bool,

    /// Partition date to stamp instead of today (YYYY-MM-DD)
    #[arg(long)]
    pub ds: Option<String>,
}

pub async fn run(args: &FetchArgs, config: &AppConfig, format: &OutputFormat) -> Result<()> {
    let ds = super::parse_ds(args.ds.as_deref())?;
    let targets = SinkTargets {
        csv: Some(CsvTarget {
            path: args.out.clone(),
            include_partition: !args.no_partition,
        }),
        warehouse: false,
    };
    super::run_pipeline_once(config, targets, ds, format).await
}
