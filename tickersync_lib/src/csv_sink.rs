//! Delimited-file sink.
//!
//! The snapshot is written to a hidden sibling file and renamed over the
//! destination, so the previous file stays intact until the new one is
//! complete.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::schema::TickerField;
use crate::snapshot::Snapshot;

#[derive(Error, Debug)]
pub enum CsvSinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("output path {0} has no file name")]
    InvalidPath(PathBuf),
}

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvSummary {
    pub rows: usize,
    pub path: PathBuf,
}

/// Writes snapshots as comma-delimited UTF-8 with a schema-ordered header.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
    include_partition: bool,
}

impl CsvSink {
    /// Sink writing the twelve record fields to `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            include_partition: false,
        }
    }

    /// Appends the `ds` column after `last_updated_utc`.
    pub fn with_partition(mut self, include_partition: bool) -> Self {
        self.include_partition = include_partition;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fields(&self) -> &'static [TickerField] {
        if self.include_partition {
            &TickerField::ALL
        } else {
            &TickerField::RECORD_FIELDS
        }
    }

    /// Overwrites the destination with `snapshot`.
    pub fn write(&self, snapshot: &Snapshot) -> Result<CsvSummary, CsvSinkError> {
        let tmp = self.temp_path()?;
        match self.write_to(&tmp, snapshot) {
            Ok(rows) => {
                if let Err(e) = fs::rename(&tmp, &self.path) {
                    let _ = fs::remove_file(&tmp);
                    tracing::error!("Failed to move {} into place: {}", tmp.display(), e);
                    return Err(e.into());
                }
                tracing::info!("Wrote {} tickers to {}", rows, self.path.display());
                Ok(CsvSummary {
                    rows,
                    path: self.path.clone(),
                })
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                tracing::error!("Failed to write {}: {}", self.path.display(), e);
                Err(e)
            }
        }
    }

    fn write_to(&self, tmp: &Path, snapshot: &Snapshot) -> Result<usize, CsvSinkError> {
        let fields = self.fields();
        let mut wtr = csv::Writer::from_path(tmp)?;
        wtr.write_record(fields.iter().map(|f| f.name()))?;
        for record in snapshot {
            let values: Vec<_> = fields.iter().map(|f| f.value(record)).collect();
            wtr.write_record(values.iter().map(|v| v.to_field().into_owned()))?;
        }
        wtr.flush()?;
        Ok(snapshot.len())
    }

    fn temp_path(&self) -> Result<PathBuf, CsvSinkError> {
        let name = self
            .path
            .file_name()
            .ok_or_else(|| CsvSinkError::InvalidPath(self.path.clone()))?;
        let mut tmp_name = std::ffi::OsString::from(".");
        tmp_name.push(name);
        tmp_name.push(".tmp");
        Ok(self.path.with_file_name(tmp_name))
    }
}
