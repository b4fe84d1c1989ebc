//! HTTP client for the reference tickers endpoint.

use std::time::Duration;

use url::Url;

use crate::{query::Query, types::TickersPage, Error, TickerQuery};

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://api.massive.com";

const TICKERS_PATH: &str = "/v3/reference/tickers";

/// Request timeout for every call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the reference tickers endpoint.
///
/// Holds one pooled `reqwest::Client` and the API key, which is appended as
/// the `apiKey` query parameter to the initial request and to every cursor.
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl Client {
    /// Creates a new client pointing at the production API.
    pub fn new(api_key: &str) -> Result<Self, Error> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Creates a new client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str, api_key: &str) -> Result<Self, Error> {
        let base_url = Url::parse(base_url).map_err(|e| {
            tracing::error!("Invalid base URL {}: {}", base_url, e);
            Error::InvalidUrl(format!("{}: {}", base_url, e))
        })?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            http,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches the first page of tickers matching `query`.
    pub async fn list_tickers(&self, query: &TickerQuery) -> Result<TickersPage, Error> {
        let url = self.base_url.join(TICKERS_PATH).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::InvalidUrl(e.to_string())
        })?;
        let url = self.with_api_key(query.add_to_url(&url));
        self.get(url).await
    }

    /// Fetches the page a `next_url` cursor points at.
    ///
    /// Cursors may be absolute or relative to the base URL.
    pub async fn follow_cursor(&self, next_url: &str) -> Result<TickersPage, Error> {
        let url = self.cursor_url(next_url)?;
        self.get(url).await
    }

    /// Resolves a cursor against the base URL and attaches the API key.
    pub fn cursor_url(&self, next_url: &str) -> Result<Url, Error> {
        let url = self.base_url.join(next_url).map_err(|e| {
            tracing::error!("Invalid cursor {}: {}", next_url, e);
            Error::InvalidUrl(format!("{}: {}", next_url, e))
        })?;
        Ok(self.with_api_key(url))
    }

    fn with_api_key(&self, mut url: Url) -> Url {
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "apiKey")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        {
            let mut query = url.query_pairs_mut();
            query.clear();
            for (k, v) in &pairs {
                query.append_pair(k, v);
            }
            query.append_pair("apiKey", &self.api_key);
        }
        url
    }

    async fn get(&self, url: Url) -> Result<TickersPage, Error> {
        // The query string carries the API key, so only the path is logged.
        tracing::debug!("GET {}", url.path());
        let resp = self
            .http
            .get(url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to get resource: {}", e.without_url());
                Error::RequestFailed
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e.without_url());
            Error::RequestFailed
        })?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Rate limited (HTTP 429): {}", truncate_body(&body));
            return Err(Error::RateLimited);
        }

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        serde_json::from_str::<TickersPage>(&body).map_err(|e| {
            let snippet = truncate_body(&body);
            tracing::error!("Failed to parse resource: {} | body: {}", e, snippet);
            Error::Decode(e.to_string())
        })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
