//! Error types for the API client.

/// Errors that can occur when making API requests.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The base URL or a pagination cursor could not be turned into a URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// An HTTP request failed (network error, timeout, or unreadable body).
    #[error("Request failed")]
    RequestFailed,
    /// The API answered HTTP 429.
    #[error("Rate limited by upstream API")]
    RateLimited,
    /// The API returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The body was not a valid ticker page.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl Error {
    /// Whether a transport-level retry has a chance of succeeding.
    ///
    /// Rate limiting is not retryable here; callers apply their own fixed
    /// backoff for it.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::RequestFailed | Error::Decode(_) => true,
            Error::HttpStatus { status, .. } => *status >= 500,
            Error::InvalidUrl(_) | Error::RateLimited => false,
        }
    }
}
