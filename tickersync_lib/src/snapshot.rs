//! The in-memory result of one fetch run.

use chrono::NaiveDate;
use tickers_api::types::TickerRecord;

/// Every ticker record retrieved by one fetch run, in arrival order.
///
/// Pages are appended as they arrive and nothing is deduplicated: a ticker
/// repeated across pages is kept twice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    records: Vec<TickerRecord>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one page of results, preserving their order.
    pub fn append_page(&mut self, page: Vec<TickerRecord>) {
        self.records.extend(page);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TickerRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TickerRecord> {
        self.records.iter()
    }

    /// Sets `ds` on every record. All records of a run share one date.
    pub fn stamp_partition(&mut self, ds: NaiveDate) {
        for record in &mut self.records {
            record.ds = Some(ds);
        }
    }

    pub fn into_records(self) -> Vec<TickerRecord> {
        self.records
    }
}

impl From<Vec<TickerRecord>> for Snapshot {
    fn from(records: Vec<TickerRecord>) -> Self {
        Self { records }
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a TickerRecord;
    type IntoIter = std::slice::Iter<'a, TickerRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
