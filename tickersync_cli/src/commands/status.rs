//! The `status` subcommand: report what the warehouse table holds.

use anyhow::Result;
use clap::Args;
use tickersync_lib::{AppConfig, Warehouse};

use crate::output::{print_warehouse_status, OutputFormat};

#[derive(Args)]
pub struct StatusArgs {}

pub async fn run(_args: &StatusArgs, config: &AppConfig, format: &OutputFormat) -> Result<()> {
    let warehouse = Warehouse::connect(config.require_warehouse()?)?;
    let status = warehouse.status()?;
    if let Err(e) = warehouse.close() {
        tracing::warn!("Failed to close warehouse connection: {}", e);
    }
    print_warehouse_status(&status, format)
}
