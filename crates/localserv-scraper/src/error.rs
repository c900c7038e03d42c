use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("no business name found at {url}")]
    MissingBusinessName { url: String },

    #[error("no services found at {url}")]
    NoServices { url: String },
}

impl ScrapeError {
    /// True for page-level retrieval failures (network failure, timeout,
    /// non-success status). Discovery treats these as "no more pages";
    /// batch extraction treats them as a single failed URL.
    #[must_use]
    pub fn is_retrieval(&self) -> bool {
        matches!(self, Self::Http(_) | Self::UnexpectedStatus { .. })
    }
}
