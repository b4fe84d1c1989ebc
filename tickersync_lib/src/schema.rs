//! The reference ticker schema: field order, CSV header names, warehouse
//! columns and their SQL types all derive from [`TickerField`].

use std::borrow::Cow;
use std::fmt;

use chrono::NaiveDate;
use tickers_api::types::TickerRecord;

/// One column of the reference schema, in canonical order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickerField {
    Ticker,
    Name,
    Market,
    Locale,
    PrimaryExchange,
    Type,
    Active,
    CurrencyName,
    Cik,
    CompositeFigi,
    ShareClassFigi,
    LastUpdatedUtc,
    Ds,
}

impl TickerField {
    /// Fields reported by the upstream API, in schema order.
    pub const RECORD_FIELDS: [TickerField; 12] = [
        TickerField::Ticker,
        TickerField::Name,
        TickerField::Market,
        TickerField::Locale,
        TickerField::PrimaryExchange,
        TickerField::Type,
        TickerField::Active,
        TickerField::CurrencyName,
        TickerField::Cik,
        TickerField::CompositeFigi,
        TickerField::ShareClassFigi,
        TickerField::LastUpdatedUtc,
    ];

    /// Record fields followed by the partition date.
    pub const ALL: [TickerField; 13] = [
        TickerField::Ticker,
        TickerField::Name,
        TickerField::Market,
        TickerField::Locale,
        TickerField::PrimaryExchange,
        TickerField::Type,
        TickerField::Active,
        TickerField::CurrencyName,
        TickerField::Cik,
        TickerField::CompositeFigi,
        TickerField::ShareClassFigi,
        TickerField::LastUpdatedUtc,
        TickerField::Ds,
    ];

    /// Field name as it appears in API payloads and CSV headers.
    pub fn name(self) -> &'static str {
        match self {
            TickerField::Ticker => "ticker",
            TickerField::Name => "name",
            TickerField::Market => "market",
            TickerField::Locale => "locale",
            TickerField::PrimaryExchange => "primary_exchange",
            TickerField::Type => "type",
            TickerField::Active => "active",
            TickerField::CurrencyName => "currency_name",
            TickerField::Cik => "cik",
            TickerField::CompositeFigi => "composite_figi",
            TickerField::ShareClassFigi => "share_class_figi",
            TickerField::LastUpdatedUtc => "last_updated_utc",
            TickerField::Ds => "ds",
        }
    }

    /// Warehouse column name.
    pub fn column(self) -> &'static str {
        match self {
            TickerField::Ticker => "TICKER",
            TickerField::Name => "NAME",
            TickerField::Market => "MARKET",
            TickerField::Locale => "LOCALE",
            TickerField::PrimaryExchange => "PRIMARY_EXCHANGE",
            TickerField::Type => "TYPE",
            TickerField::Active => "ACTIVE",
            TickerField::CurrencyName => "CURRENCY_NAME",
            TickerField::Cik => "CIK",
            TickerField::CompositeFigi => "COMPOSITE_FIGI",
            TickerField::ShareClassFigi => "SHARE_CLASS_FIGI",
            TickerField::LastUpdatedUtc => "LAST_UPDATED_UTC",
            TickerField::Ds => "DS",
        }
    }

    pub fn sql_type(self) -> &'static str {
        match self {
            TickerField::Ticker => "VARCHAR(20)",
            TickerField::Name => "VARCHAR(500)",
            TickerField::Market => "VARCHAR(50)",
            TickerField::Locale => "VARCHAR(10)",
            TickerField::PrimaryExchange => "VARCHAR(10)",
            TickerField::Type => "VARCHAR(20)",
            TickerField::Active => "BOOLEAN",
            TickerField::CurrencyName => "VARCHAR(50)",
            TickerField::Cik => "VARCHAR(20)",
            TickerField::CompositeFigi => "VARCHAR(50)",
            TickerField::ShareClassFigi => "VARCHAR(50)",
            TickerField::LastUpdatedUtc => "TIMESTAMP",
            TickerField::Ds => "DATE",
        }
    }

    /// Reads this field from `record`. Absent values come back as [`FieldValue::Null`].
    pub fn value(self, record: &TickerRecord) -> FieldValue<'_> {
        match self {
            TickerField::Ticker => FieldValue::Text(record.ticker.as_str()),
            TickerField::Name => text(&record.name),
            TickerField::Market => text(&record.market),
            TickerField::Locale => text(&record.locale),
            TickerField::PrimaryExchange => text(&record.primary_exchange),
            TickerField::Type => text(&record.ticker_type),
            TickerField::Active => record.active.map_or(FieldValue::Null, FieldValue::Bool),
            TickerField::CurrencyName => text(&record.currency_name),
            TickerField::Cik => text(&record.cik),
            TickerField::CompositeFigi => text(&record.composite_figi),
            TickerField::ShareClassFigi => text(&record.share_class_figi),
            TickerField::LastUpdatedUtc => text(&record.last_updated_utc),
            TickerField::Ds => record.ds.map_or(FieldValue::Null, FieldValue::Date),
        }
    }
}

fn text(value: &Option<String>) -> FieldValue<'_> {
    match value {
        Some(s) => FieldValue::Text(s.as_str()),
        None => FieldValue::Null,
    }
}

impl fmt::Display for TickerField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A scalar read out of a [`TickerRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Null,
    Text(&'a str),
    Bool(bool),
    Date(NaiveDate),
}

impl FieldValue<'_> {
    /// Text form used in delimited output: nulls are empty, booleans are
    /// `true`/`false`, dates are `YYYY-MM-DD`, strings are verbatim.
    pub fn to_field(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Null => Cow::Borrowed(""),
            FieldValue::Text(s) => Cow::Borrowed(s),
            FieldValue::Bool(true) => Cow::Borrowed("true"),
            FieldValue::Bool(false) => Cow::Borrowed("false"),
            FieldValue::Date(d) => Cow::Owned(d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// `CREATE TABLE IF NOT EXISTS` over the full column set.
pub fn create_table_sql(table: &str) -> String {
    let columns: Vec<String> = TickerField::ALL
        .iter()
        .map(|f| format!("{} {}", f.column(), f.sql_type()))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        table,
        columns.join(", ")
    )
}

/// Parameterized `INSERT` naming `columns` in order.
pub fn insert_sql(table: &str, columns: &[TickerField]) -> String {
    let names: Vec<&str> = columns.iter().map(|f| f.column()).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        names.join(", "),
        placeholders.join(", ")
    )
}
