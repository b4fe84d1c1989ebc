//! Warehouse sink: loads a snapshot into a SQL table in one transaction.

use std::path::Path;

use chrono::{DateTime, Local, NaiveDate};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Transaction};
use serde::Serialize;
use tickers_api::types::TickerRecord;

use crate::config::WarehouseConfig;
use crate::schema::{self, FieldValue, TickerField};
use crate::snapshot::Snapshot;

/// Records per INSERT batch.
pub const BATCH_SIZE: usize = 100;

#[derive(thiserror::Error, Debug)]
pub enum WarehouseError {
    #[error("failed to connect to warehouse database {database}: {source}")]
    Connection {
        database: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Mismatch: {values} values vs {columns} columns (record {ticker})")]
    ColumnMismatch {
        values: usize,
        columns: usize,
        ticker: String,
    },
    #[error("invalid {column} value '{value}' for ticker {ticker}")]
    InvalidValue {
        column: &'static str,
        value: String,
        ticker: String,
    },
}

/// Turns one record into the values bound to an INSERT, in column order.
pub type RowExtractor = fn(&TickerRecord) -> Result<Vec<Value>, WarehouseError>;

/// The columns an INSERT names and how to produce their values.
#[derive(Clone)]
pub struct ColumnMapping {
    columns: Vec<TickerField>,
    extract: RowExtractor,
}

impl ColumnMapping {
    pub fn new(columns: Vec<TickerField>, extract: RowExtractor) -> Self {
        Self { columns, extract }
    }

    /// Every schema column, partition date included.
    pub fn tickers() -> Self {
        Self::new(TickerField::ALL.to_vec(), ticker_row)
    }

    pub fn columns(&self) -> &[TickerField] {
        &self.columns
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self::tickers()
    }
}

/// Values for every schema column of `record`.
pub fn ticker_row(record: &TickerRecord) -> Result<Vec<Value>, WarehouseError> {
    TickerField::ALL
        .iter()
        .map(|field| sql_value(*field, record))
        .collect()
}

fn sql_value(field: TickerField, record: &TickerRecord) -> Result<Value, WarehouseError> {
    Ok(match field.value(record) {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(b) => Value::Integer(i64::from(b)),
        FieldValue::Date(d) => Value::Text(d.format("%Y-%m-%d").to_string()),
        FieldValue::Text(s) if field == TickerField::LastUpdatedUtc => {
            let parsed = DateTime::parse_from_rfc3339(s).map_err(|_| {
                WarehouseError::InvalidValue {
                    column: field.column(),
                    value: s.to_string(),
                    ticker: record.ticker.clone(),
                }
            })?;
            Value::Text(
                parsed
                    .naive_utc()
                    .format("%Y-%m-%d %H:%M:%S%.f")
                    .to_string(),
            )
        }
        FieldValue::Text(s) => Value::Text(s.to_string()),
    })
}

/// What a successful load wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub rows: usize,
    pub table: String,
    pub ds: NaiveDate,
}

/// What the target table currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarehouseStatus {
    pub table: String,
    pub exists: bool,
    pub rows: i64,
    pub partitions: Vec<NaiveDate>,
    /// Newest partition date and its row count.
    pub latest: Option<(NaiveDate, i64)>,
}

/// An open warehouse session bound to one target table.
pub struct Warehouse {
    conn: Connection,
    table: String,
}

impl Warehouse {
    /// Opens the configured database. Failure here aborts a load.
    pub fn connect(config: &WarehouseConfig) -> Result<Self, WarehouseError> {
        tracing::info!(
            "Connecting to warehouse (account={}, user={}, warehouse={}, role={}, database={}, schema={})",
            config.account.as_deref().unwrap_or("-"),
            config.user.as_deref().unwrap_or("-"),
            config.warehouse.as_deref().unwrap_or("-"),
            config.role.as_deref().unwrap_or("-"),
            config.database,
            config.schema.as_deref().unwrap_or("-"),
        );
        let conn = open_connection(&config.database).map_err(|source| {
            WarehouseError::Connection {
                database: config.database.clone(),
                source,
            }
        })?;
        tracing::info!("Connected to warehouse successfully");
        Ok(Self {
            conn,
            table: config.table.clone(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Idempotent `CREATE TABLE IF NOT EXISTS`. Runs in autocommit, outside
    /// any load transaction.
    pub fn ensure_table(&self) -> Result<(), WarehouseError> {
        self.conn
            .execute_batch(&schema::create_table_sql(&self.table))?;
        tracing::info!("Table {} created or already exists", self.table);
        Ok(())
    }

    /// Inserts `records` in batches of `batch_size` inside one transaction.
    ///
    /// Every row is checked against the column count before its batch runs;
    /// a mismatch aborts the whole load. Nothing is visible unless every
    /// batch succeeds.
    pub fn insert_records(
        &mut self,
        records: &[TickerRecord],
        mapping: &ColumnMapping,
        batch_size: usize,
    ) -> Result<usize, WarehouseError> {
        let insert_sql = schema::insert_sql(&self.table, mapping.columns());
        let tx = self.conn.transaction()?;
        match insert_batches(&tx, &insert_sql, records, mapping, batch_size.max(1)) {
            Ok(count) => {
                tx.commit()?;
                tracing::info!("Successfully ingested {} tickers into {}", count, self.table);
                Ok(count)
            }
            Err(e) => {
                tracing::error!("Load into {} failed, rolling back: {}", self.table, e);
                if let Err(rollback_err) = tx.rollback() {
                    tracing::error!("Rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    pub fn row_count(&self) -> Result<i64, WarehouseError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }

    /// Rows stamped with partition date `ds`.
    pub fn partition_count(&self, ds: NaiveDate) -> Result<i64, WarehouseError> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE DS = ?1", self.table);
        Ok(self
            .conn
            .query_row(&sql, [ds.format("%Y-%m-%d").to_string()], |row| {
                row.get(0)
            })?)
    }

    /// Distinct partition dates present in the table, oldest first.
    pub fn partitions(&self) -> Result<Vec<NaiveDate>, WarehouseError> {
        let sql = format!(
            "SELECT DISTINCT DS FROM {} WHERE DS IS NOT NULL ORDER BY DS",
            self.table
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut dates = Vec::new();
        for row in rows {
            let raw = row?;
            match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
                Ok(date) => dates.push(date),
                Err(e) => tracing::warn!("Skipping unparsable DS value {}: {}", raw, e),
            }
        }
        Ok(dates)
    }

    /// Whether the target table has been created yet.
    pub fn table_exists(&self) -> Result<bool, WarehouseError> {
        let found: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [&self.table],
            |row| row.get(0),
        )?;
        Ok(found > 0)
    }

    /// Row totals and partition dates of the target table. A missing table
    /// reports as empty rather than failing.
    pub fn status(&self) -> Result<WarehouseStatus, WarehouseError> {
        if !self.table_exists()? {
            return Ok(WarehouseStatus {
                table: self.table.clone(),
                exists: false,
                rows: 0,
                partitions: Vec::new(),
                latest: None,
            });
        }
        let partitions = self.partitions()?;
        let latest = match partitions.last() {
            Some(&ds) => Some((ds, self.partition_count(ds)?)),
            None => None,
        };
        Ok(WarehouseStatus {
            table: self.table.clone(),
            exists: true,
            rows: self.row_count()?,
            partitions,
            latest,
        })
    }

    /// Releases the connection.
    pub fn close(self) -> Result<(), WarehouseError> {
        self.conn.close().map_err(|(_, e)| WarehouseError::Sqlite(e))?;
        tracing::info!("Warehouse connection closed");
        Ok(())
    }
}

fn open_connection(database: &str) -> Result<Connection, rusqlite::Error> {
    let conn = if database == ":memory:" {
        Connection::open_in_memory()?
    } else {
        Connection::open(Path::new(database))?
    };
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(conn)
}

fn insert_batches(
    tx: &Transaction<'_>,
    insert_sql: &str,
    records: &[TickerRecord],
    mapping: &ColumnMapping,
    batch_size: usize,
) -> Result<usize, WarehouseError> {
    let column_count = mapping.columns().len();
    let mut stmt = tx.prepare(insert_sql)?;
    let mut inserted = 0usize;

    for (batch_index, batch) in records.chunks(batch_size).enumerate() {
        let rows = batch
            .iter()
            .map(|record| {
                let row = (mapping.extract)(record)?;
                if row.len() != column_count {
                    return Err(WarehouseError::ColumnMismatch {
                        values: row.len(),
                        columns: column_count,
                        ticker: record.ticker.clone(),
                    });
                }
                Ok(row)
            })
            .collect::<Result<Vec<_>, _>>()?;

        for row in &rows {
            stmt.execute(params_from_iter(row.iter()))?;
        }
        inserted += rows.len();
        tracing::info!(
            "Ingested batch {} ({} records)",
            batch_index + 1,
            rows.len()
        );
    }

    Ok(inserted)
}

/// Runs the full load sequence against one configured warehouse.
pub struct WarehouseLoader<'a> {
    config: &'a WarehouseConfig,
    mapping: ColumnMapping,
    batch_size: usize,
}

impl<'a> WarehouseLoader<'a> {
    pub fn new(config: &'a WarehouseConfig) -> Self {
        Self {
            config,
            mapping: ColumnMapping::tickers(),
            batch_size: BATCH_SIZE,
        }
    }

    pub fn with_mapping(mut self, mapping: ColumnMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Loads `snapshot` stamped with today's local date.
    pub fn load(&self, snapshot: &mut Snapshot) -> Result<LoadSummary, WarehouseError> {
        self.load_with_date(snapshot, Local::now().date_naive())
    }

    /// Connect, create the table, stamp `ds`, insert in batches, commit.
    ///
    /// The connection is released on every path. Table creation is not
    /// undone when the insert fails.
    pub fn load_with_date(
        &self,
        snapshot: &mut Snapshot,
        ds: NaiveDate,
    ) -> Result<LoadSummary, WarehouseError> {
        let mut warehouse = Warehouse::connect(self.config)?;
        let result = self.load_into(&mut warehouse, snapshot, ds);
        if let Err(e) = warehouse.close() {
            tracing::warn!("Failed to close warehouse connection: {}", e);
        }
        result
    }

    fn load_into(
        &self,
        warehouse: &mut Warehouse,
        snapshot: &mut Snapshot,
        ds: NaiveDate,
    ) -> Result<LoadSummary, WarehouseError> {
        warehouse.ensure_table()?;
        snapshot.stamp_partition(ds);
        tracing::info!(
            "Ingesting {} tickers into {} (ds={})",
            snapshot.len(),
            warehouse.table(),
            ds
        );
        let rows = warehouse.insert_records(snapshot.records(), &self.mapping, self.batch_size)?;
        Ok(LoadSummary {
            rows,
            table: warehouse.table().to_string(),
            ds,
        })
    }
}
