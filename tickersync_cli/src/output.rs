use anyhow::Result;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tickersync_lib::{RunSummary, SchedulerStats, Termination, WarehouseStatus};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "markdown" | "md" => Ok(Self::Markdown),
            other => anyhow::bail!(
                "unknown output format '{}'. Expected one of: table, json, csv, markdown",
                other
            ),
        }
    }
}

#[derive(Tabled, Serialize)]
struct RunRow {
    #[tabled(rename = "Started")]
    #[serde(rename = "Started")]
    started_at: String,
    #[tabled(rename = "DS")]
    #[serde(rename = "DS")]
    ds: String,
    #[tabled(rename = "Fetched")]
    #[serde(rename = "Fetched")]
    fetched: usize,
    #[tabled(rename = "Pages")]
    #[serde(rename = "Pages")]
    pages: usize,
    #[tabled(rename = "Requests")]
    #[serde(rename = "Requests")]
    requests: usize,
    #[tabled(rename = "Fetch")]
    #[serde(rename = "Fetch")]
    termination: String,
    #[tabled(rename = "CSV")]
    #[serde(rename = "CSV")]
    csv: String,
    #[tabled(rename = "Warehouse")]
    #[serde(rename = "Warehouse")]
    warehouse: String,
}

#[derive(Tabled, Serialize)]
struct ScheduleRow {
    #[tabled(rename = "Runs")]
    #[serde(rename = "Runs")]
    runs: usize,
    #[tabled(rename = "Failures")]
    #[serde(rename = "Failures")]
    failures: usize,
    #[tabled(rename = "Skipped")]
    #[serde(rename = "Skipped")]
    skipped: usize,
}

#[derive(Tabled, Serialize)]
struct StatusRow {
    #[tabled(rename = "Table")]
    #[serde(rename = "Table")]
    table: String,
    #[tabled(rename = "Rows")]
    #[serde(rename = "Rows")]
    rows: i64,
    #[tabled(rename = "Partitions")]
    #[serde(rename = "Partitions")]
    partitions: usize,
    #[tabled(rename = "Latest DS")]
    #[serde(rename = "Latest DS")]
    latest_ds: String,
    #[tabled(rename = "Latest Rows")]
    #[serde(rename = "Latest Rows")]
    latest_rows: i64,
}

// -- Row builders --

fn build_run_row(summary: &RunSummary) -> RunRow {
    RunRow {
        started_at: summary.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ds: summary.ds.to_string(),
        fetched: summary.fetched,
        pages: summary.pages,
        requests: summary.requests,
        termination: describe_termination(&summary.termination),
        csv: describe_sink(summary.csv.as_ref(), |s| {
            format!("{} rows -> {}", s.rows, s.path.display())
        }),
        warehouse: describe_sink(summary.warehouse.as_ref(), |s| {
            format!("{} rows -> {} (ds={})", s.rows, s.table, s.ds)
        }),
    }
}

fn build_schedule_row(stats: &SchedulerStats) -> ScheduleRow {
    ScheduleRow {
        runs: stats.runs,
        failures: stats.failures,
        skipped: stats.skipped,
    }
}

fn build_status_row(status: &WarehouseStatus) -> StatusRow {
    let (latest_ds, latest_rows) = match status.latest {
        Some((ds, rows)) => (ds.to_string(), rows),
        None if status.exists => ("-".to_string(), 0),
        None => ("(table missing)".to_string(), 0),
    };
    StatusRow {
        table: status.table.clone(),
        rows: status.rows,
        partitions: status.partitions.len(),
        latest_ds,
        latest_rows,
    }
}

fn describe_termination(termination: &Termination) -> String {
    match termination {
        Termination::Exhausted => "complete".to_string(),
        Termination::NoResults => "complete (empty page)".to_string(),
        Termination::Failed(e) => format!("failed: {}", e),
    }
}

fn describe_sink<T, E: std::fmt::Display>(
    result: Option<&Result<T, E>>,
    ok: impl Fn(&T) -> String,
) -> String {
    match result {
        None => "-".to_string(),
        Some(Ok(value)) => ok(value),
        Some(Err(e)) => format!("failed: {}", e),
    }
}

// -- Printing --

pub fn print_run_summary(summary: &RunSummary, format: &OutputFormat) -> Result<()> {
    print_rows(vec![build_run_row(summary)], format)
}

pub fn print_schedule_stats(stats: &SchedulerStats, format: &OutputFormat) -> Result<()> {
    print_rows(vec![build_schedule_row(stats)], format)
}

pub fn print_warehouse_status(status: &WarehouseStatus, format: &OutputFormat) -> Result<()> {
    print_rows(vec![build_status_row(status)], format)
}

fn print_rows<T: Tabled + Serialize>(rows: Vec<T>, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => print_json(&rows),
    }
    Ok(())
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}
