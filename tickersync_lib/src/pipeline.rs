//! One snapshot run: fetch every ticker, then hand the snapshot to each
//! configured sink.

use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDate};

use crate::config::{AppConfig, WarehouseConfig};
use crate::csv_sink::{CsvSink, CsvSinkError, CsvSummary};
use crate::error::TickerSyncError;
use crate::fetcher::{Termination, TickerFetcher};
use crate::warehouse::{LoadSummary, WarehouseError, WarehouseLoader};

/// Delimited-file destination.
#[derive(Debug, Clone)]
pub struct CsvTarget {
    pub path: PathBuf,
    pub include_partition: bool,
}

/// Which sinks a run writes to.
#[derive(Debug, Clone, Default)]
pub struct SinkTargets {
    pub csv: Option<CsvTarget>,
    pub warehouse: bool,
}

impl SinkTargets {
    pub fn is_empty(&self) -> bool {
        self.csv.is_none() && !self.warehouse
    }
}

/// What one run did. Sink fields are `None` when the sink was not requested
/// or was skipped because the fetch failed.
#[derive(Debug)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    pub ds: NaiveDate,
    pub fetched: usize,
    pub pages: usize,
    pub requests: usize,
    pub termination: Termination,
    pub csv: Option<Result<CsvSummary, CsvSinkError>>,
    pub warehouse: Option<Result<LoadSummary, WarehouseError>>,
}

impl RunSummary {
    /// True when the fetch did not fail and every attempted sink succeeded.
    pub fn is_success(&self) -> bool {
        self.failures().is_empty()
    }

    /// Human-readable failure descriptions, empty on success.
    pub fn failures(&self) -> Vec<String> {
        let mut failures = Vec::new();
        if let Termination::Failed(e) = &self.termination {
            failures.push(format!("fetch failed: {}", e));
        }
        if let Some(Err(e)) = &self.csv {
            failures.push(format!("csv sink failed: {}", e));
        }
        if let Some(Err(e)) = &self.warehouse {
            failures.push(format!("warehouse sink failed: {}", e));
        }
        failures
    }
}

/// Fetches a snapshot and writes it to the requested sinks.
pub struct Pipeline {
    fetcher: TickerFetcher,
    targets: SinkTargets,
    warehouse: Option<WarehouseConfig>,
    ds_override: Option<NaiveDate>,
}

impl Pipeline {
    /// Fails if the warehouse sink is requested without warehouse config.
    pub fn new(
        config: &AppConfig,
        targets: SinkTargets,
        ds_override: Option<NaiveDate>,
    ) -> Result<Self, TickerSyncError> {
        let warehouse = if targets.warehouse {
            Some(config.require_warehouse()?.clone())
        } else {
            None
        };
        Ok(Self {
            fetcher: TickerFetcher::new(config)?,
            targets,
            warehouse,
            ds_override,
        })
    }

    pub fn targets(&self) -> &SinkTargets {
        &self.targets
    }

    /// Runs fetch then sinks. Sinks are independent: one failing does not
    /// stop the other. A failed fetch skips both, leaving any previous CSV
    /// and table contents untouched.
    pub async fn run_once(&self) -> RunSummary {
        let started_at = Local::now();
        let ds = self.ds_override.unwrap_or_else(|| started_at.date_naive());

        let query = self.fetcher.base_query();
        let report = self.fetcher.fetch(&query).await;
        let mut snapshot = report.snapshot;

        let mut summary = RunSummary {
            started_at,
            ds,
            fetched: snapshot.len(),
            pages: report.pages,
            requests: report.requests,
            termination: report.termination,
            csv: None,
            warehouse: None,
        };

        if summary.termination.is_failure() {
            tracing::error!(
                "Fetch failed after {} tickers, skipping sinks: {}",
                summary.fetched,
                summary.termination
            );
            return summary;
        }

        snapshot.stamp_partition(ds);

        if let Some(target) = &self.targets.csv {
            let sink = CsvSink::new(&target.path).with_partition(target.include_partition);
            summary.csv = Some(sink.write(&snapshot));
        }

        if let Some(config) = &self.warehouse {
            let loader = WarehouseLoader::new(config);
            let result = loader.load_with_date(&mut snapshot, ds);
            if let Err(e) = &result {
                tracing::error!("Warehouse load failed: {}", e);
            }
            summary.warehouse = Some(result);
        }

        summary
    }
}
