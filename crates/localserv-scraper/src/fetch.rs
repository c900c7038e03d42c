//! Single-document retrieval. The only module that touches the wire.

use std::time::Duration;

use reqwest::Client;

use crate::error::ScrapeError;

/// HTTP fetcher with a fixed browser-like identity and bounded timeout.
///
/// No retry layer: a failed fetch is a typed error the caller
/// interprets (discovery stops paginating, batch extraction records a
/// per-URL failure).
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Creates a fetcher with the given timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Fetches one URL's document body as text.
    ///
    /// Decoding honors the server-declared charset and substitutes
    /// malformed bytes instead of failing (`Response::text` semantics).
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::Http`] — network failure or timeout.
    /// - [`ScrapeError::UnexpectedStatus`] — any non-2xx status.
    pub async fn fetch_html(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        Ok(response.text().await?)
    }
}
