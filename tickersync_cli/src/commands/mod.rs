//! CLI subcommand implementations.

pub mod fetch;
pub mod load;
pub mod run;
pub mod schedule;
pub mod status;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use tickersync_lib::{validation, AppConfig, Pipeline, SinkTargets};

use crate::output::{print_run_summary, OutputFormat};

/// Parses an optional `--ds` override.
pub(crate) fn parse_ds(ds: Option<&str>) -> Result<Option<NaiveDate>> {
    Ok(ds.map(validation::validate_date).transpose()?)
}

/// Runs the pipeline once, prints the summary, and fails the process when
/// the fetch or any sink failed.
pub(crate) async fn run_pipeline_once(
    config: &AppConfig,
    targets: SinkTargets,
    ds: Option<NaiveDate>,
    format: &OutputFormat,
) -> Result<()> {
    let pipeline = Pipeline::new(config, targets, ds)?;
    let summary = pipeline.run_once().await;
    print_run_summary(&summary, format)?;
    if !summary.is_success() {
        bail!("run failed: {}", summary.failures().join("; "));
    }
    Ok(())
}
