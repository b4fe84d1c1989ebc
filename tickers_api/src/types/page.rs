use serde::{Deserialize, Serialize};

use super::TickerRecord;

/// One page of the cursor-paginated tickers listing.
///
/// A successful page carries `results` and, unless it is the last one,
/// a `next_url` cursor. Error pages carry `status: "ERROR"` and an
/// `error` message instead.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TickersPage {
    #[serde(default)]
    pub results: Option<Vec<TickerRecord>>,
    #[serde(default)]
    pub next_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
}

impl TickersPage {
    /// True when the API flagged this page as an error (its rate-limit signal).
    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some("ERROR")
    }
}
