//! Cursor pagination over the reference tickers endpoint.
//!
//! [`TickerFetcher::fetch`] walks `next_url` cursors until the API stops
//! returning one, pacing requests with a fixed courtesy delay. An error page
//! (`status: "ERROR"`, or HTTP 429) is the API's rate-limit signal and gets
//! exactly one retry after a fixed backoff; if the initial request is still
//! rate limited after its retry the run fails. Transport failures are retried
//! with exponential backoff. Nothing here returns `Err`: failures end the
//! walk and are reported through [`Termination`] alongside whatever records
//! were collected.

use std::fmt;

use tickers_api::types::{TickerRecord, TickersPage};
use tickers_api::{Client, Query, TickerQuery};
use tokio::time::sleep;

use crate::config::{AppConfig, FetchSettings};
use crate::error::TickerSyncError;
use crate::snapshot::Snapshot;

/// Why pagination stopped.
#[derive(Debug)]
pub enum Termination {
    /// The last page had no `next_url`.
    Exhausted,
    /// A page arrived without `results`; treated as end of data.
    NoResults,
    /// A request kept failing after retries. The snapshot is partial.
    Failed(tickers_api::Error),
}

impl Termination {
    pub fn is_failure(&self) -> bool {
        matches!(self, Termination::Failed(_))
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exhausted => write!(f, "exhausted"),
            Termination::NoResults => write!(f, "stopped on page without results"),
            Termination::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Outcome of one fetch run.
#[derive(Debug)]
pub struct FetchReport {
    pub snapshot: Snapshot,
    /// Pages whose `results` were appended.
    pub pages: usize,
    /// HTTP requests issued, retries included.
    pub requests: usize,
    /// Rate-limit retries performed (at most one per cursor).
    pub rate_limit_retries: usize,
    pub termination: Termination,
}

impl FetchReport {
    fn new() -> Self {
        Self {
            snapshot: Snapshot::new(),
            pages: 0,
            requests: 0,
            rate_limit_retries: 0,
            termination: Termination::Exhausted,
        }
    }
}

#[derive(Clone, Copy)]
enum Target<'a> {
    Initial(&'a TickerQuery),
    Cursor(&'a str),
}

/// Walks the paginated tickers listing into a [`Snapshot`].
pub struct TickerFetcher {
    client: Client,
    settings: FetchSettings,
}

impl TickerFetcher {
    /// Builds a fetcher against the configured API host.
    pub fn new(config: &AppConfig) -> Result<Self, TickerSyncError> {
        let client = Client::with_base_url(&config.api.base_url, &config.api.api_key)?;
        Ok(Self::with_client(client, config.fetch.clone()))
    }

    pub fn with_client(client: Client, settings: FetchSettings) -> Self {
        Self { client, settings }
    }

    /// The base query of a snapshot run, honouring the configured page size.
    pub fn base_query(&self) -> TickerQuery {
        TickerQuery::default().with_limit(self.settings.limit)
    }

    /// Fetches every page reachable from `query`.
    pub async fn fetch(&self, query: &TickerQuery) -> FetchReport {
        let mut report = FetchReport::new();

        tracing::info!("Fetching tickers from {}", self.client.base_url());
        let mut page = match self
            .fetch_with_rate_limit_retry(Target::Initial(query), &mut report)
            .await
        {
            Ok(page) if page.is_error() => {
                // Nothing was fetched; not an empty listing.
                tracing::error!(
                    "Initial ticker request still rate limited after retry: {}",
                    page.error.as_deref().unwrap_or("unknown error")
                );
                report.termination = Termination::Failed(tickers_api::Error::RateLimited);
                return report;
            }
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Initial ticker request failed: {}", e);
                report.termination = Termination::Failed(e);
                return report;
            }
        };

        match page.results.take() {
            Some(results) => self.append(&mut report, results, &page),
            None => {
                if page.next_url.is_none() {
                    tracing::info!("No results in initial response");
                    report.termination = Termination::NoResults;
                    return report;
                }
            }
        }

        while let Some(next_url) = page.next_url.take() {
            sleep(self.settings.page_delay).await;
            tracing::info!("Fetching next page...");

            page = match self
                .fetch_with_rate_limit_retry(Target::Cursor(&next_url), &mut report)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!(
                        "Pagination aborted after {} tickers: {}",
                        report.snapshot.len(),
                        e
                    );
                    report.termination = Termination::Failed(e);
                    return report;
                }
            };

            match page.results.take() {
                Some(results) => self.append(&mut report, results, &page),
                None => {
                    tracing::info!("No results in response, stopping pagination");
                    report.termination = Termination::NoResults;
                    break;
                }
            }
        }

        tracing::info!(
            "Fetched {} tickers across {} page(s) ({} requests)",
            report.snapshot.len(),
            report.pages,
            report.requests
        );
        report
    }

    fn append(&self, report: &mut FetchReport, results: Vec<TickerRecord>, page: &TickersPage) {
        let count = results.len();
        report.snapshot.append_page(results);
        report.pages += 1;
        tracing::debug!(
            "Page {}: {} tickers ({} total, count={:?}, request_id={})",
            report.pages,
            count,
            report.snapshot.len(),
            page.count,
            page.request_id.as_deref().unwrap_or("-")
        );
    }

    /// Requests one page, retrying exactly once on a rate-limit signal
    /// (an error page or HTTP 429).
    ///
    /// The retry's response is returned as-is, even if it is another error
    /// page; a second HTTP 429 becomes an empty error page so both forms of
    /// the signal reach the caller the same way.
    async fn fetch_with_rate_limit_retry(
        &self,
        target: Target<'_>,
        report: &mut FetchReport,
    ) -> Result<TickersPage, tickers_api::Error> {
        let first = self.request(target, report).await;
        let rate_limited = match &first {
            Ok(page) if page.is_error() => {
                tracing::warn!(
                    "Error: {}",
                    page.error.as_deref().unwrap_or("unknown error")
                );
                true
            }
            Err(tickers_api::Error::RateLimited) => true,
            _ => false,
        };
        if !rate_limited {
            return first;
        }

        tracing::warn!(
            "Rate limit hit. Waiting {:.1}s before retrying...",
            self.settings.rate_limit_backoff.as_secs_f64()
        );
        sleep(self.settings.rate_limit_backoff).await;
        report.rate_limit_retries += 1;

        match self.request(target, report).await {
            Err(tickers_api::Error::RateLimited) => Ok(TickersPage {
                status: Some("ERROR".to_string()),
                error: Some("rate limited on retry".to_string()),
                ..Default::default()
            }),
            other => other,
        }
    }

    /// Issues one logical request, retrying transport failures with backoff.
    async fn request(
        &self,
        target: Target<'_>,
        report: &mut FetchReport,
    ) -> Result<TickersPage, tickers_api::Error> {
        let retry = &self.settings.retry;
        let mut attempt = 0usize;
        loop {
            report.requests += 1;
            let result = match target {
                Target::Initial(query) => self.client.list_tickers(query).await,
                Target::Cursor(url) => self.client.follow_cursor(url).await,
            };
            match result {
                Ok(page) => return Ok(page),
                Err(err) => {
                    attempt += 1;
                    if attempt > retry.max_retries || !err.is_retryable() {
                        return Err(err);
                    }
                    let delay = retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        "Ticker request failed: {} (attempt {}/{}), retrying in {:.1}s",
                        err,
                        attempt,
                        retry.max_retries,
                        delay.as_secs_f64()
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
