use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One tradable instrument as reported by the reference tickers endpoint.
///
/// Only the fields of the reference schema are kept; anything else in the
/// upstream payload is dropped during decoding. Every field except `ticker`
/// may be absent upstream and is then `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerRecord {
    #[serde(default)]
    pub ticker: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub primary_exchange: Option<String>,
    #[serde(default, rename = "type")]
    pub ticker_type: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub currency_name: Option<String>,
    #[serde(default)]
    pub cik: Option<String>,
    #[serde(default)]
    pub composite_figi: Option<String>,
    #[serde(default)]
    pub share_class_figi: Option<String>,
    #[serde(default)]
    pub last_updated_utc: Option<String>,
    /// Partition date. Never sent by the API; stamped by sinks at load time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ds: Option<NaiveDate>,
}
