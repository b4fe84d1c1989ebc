use url::Url;

use super::common::{Query, QueryCommon};

/// Snapshot runs always walk the listing by ticker symbol.
const SORT_KEY: &str = "ticker";

/// Query for `GET /v3/reference/tickers`.
///
/// The default value is the base query of a full snapshot run:
/// active stocks, ascending by ticker, 1000 per page.
#[derive(Clone, Debug)]
pub struct TickerQuery {
    pub common: QueryCommon,
    pub market: Option<String>,
    pub active: Option<bool>,
}

impl Default for TickerQuery {
    fn default() -> Self {
        Self {
            common: QueryCommon::default(),
            market: Some("stocks".to_string()),
            active: Some(true),
        }
    }
}

impl Query for TickerQuery {
    fn get_common(&mut self) -> &mut QueryCommon {
        &mut self.common
    }

    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        if let Some(market) = &self.market {
            url.query_pairs_mut().append_pair("market", market);
        }
        if let Some(active) = self.active {
            url.query_pairs_mut()
                .append_pair("active", if active { "true" } else { "false" });
        }
        let mut url = self.common.add_to_url(&url);
        url.query_pairs_mut().append_pair("sort", SORT_KEY);
        url
    }
}

impl TickerQuery {
    pub fn with_market(mut self, market: &str) -> Self {
        self.market = Some(market.to_string());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }
}
