//! Library layer for tickersync: paginated reference-ticker fetching, CSV and
//! warehouse sinks, and the periodic scheduler.
//!
//! Wraps the `tickers_api` client with pacing, rate-limit and transport retry
//! handling, and turns each fetch into a date-partitioned snapshot.

pub mod config;
pub mod csv_sink;
pub mod error;
pub mod fetcher;
pub mod pipeline;
pub mod scheduler;
pub mod schema;
pub mod snapshot;
pub mod validation;
pub mod warehouse;

pub use tickers_api;
pub use tickers_api::types;
pub use tickers_api::{Query, SortDirection, TickerQuery};

pub use config::{AppConfig, ConfigError, FetchSettings, RetryConfig, WarehouseConfig};
pub use csv_sink::{CsvSink, CsvSinkError, CsvSummary};
pub use error::TickerSyncError;
pub use fetcher::{FetchReport, Termination, TickerFetcher};
pub use pipeline::{CsvTarget, Pipeline, RunSummary, SinkTargets};
pub use scheduler::{Scheduler, SchedulerStats};
pub use schema::{FieldValue, TickerField};
pub use snapshot::Snapshot;
pub use warehouse::{
    ColumnMapping, LoadSummary, Warehouse, WarehouseError, WarehouseLoader, WarehouseStatus,
};
