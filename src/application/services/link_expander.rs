//! Shortened-URL expansion.
//!
//! Shorteners answer with a redirect; we read the `Location` header
//! instead of following it, under the same retry policy the image
//! downloader uses.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::infrastructure::net::RetryPolicy;

/// Errors from a single expansion.
#[derive(Debug, thiserror::Error)]
pub enum ExpandError {
    /// Request could not be built or sent.
    #[error("request failed: {0}")]
    Network(String),
    /// The server redirected without a usable `Location` header.
    #[error("redirect without location for {0}")]
    NoLocation(String),
}

/// Default per-attempt timeout for expansion requests.
pub const DEFAULT_EXPAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Expands shortener URLs to their redirect targets.
pub struct LinkExpander {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl LinkExpander {
    /// Creates an expander with the given retry policy.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(retry: RetryPolicy) -> Result<Self, ExpandError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(DEFAULT_EXPAND_TIMEOUT)
            .build()
            .map_err(|e| ExpandError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, retry })
    }

    /// Resolves `url` to its redirect target, retrying transient failures.
    /// A URL that does not redirect expands to itself.
    ///
    /// # Errors
    /// Returns the last failure once retries are exhausted.
    pub async fn expand(&self, url: &str) -> Result<String, ExpandError> {
        let mut delays = self.retry.delays();
        let mut last_err = ExpandError::Network("no attempts configured".to_string());

        for attempt in 1..=self.retry.max_attempts {
            match self.resolve_once(url).await {
                Ok(expanded) => return Ok(expanded),
                Err(e) => {
                    warn!(url = %url, attempt, error = %e, "expansion attempt failed");
                    last_err = e;
                    if attempt < self.retry.max_attempts
                        && let Some(delay) = delays.next()
                    {
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_err)
    }

    /// Like [`expand`](Self::expand) but falls back to the input on
    /// persistent failure, for callers that prefer a shortened link over
    /// none.
    pub async fn expand_or_keep(&self, url: &str) -> String {
        match self.expand(url).await {
            Ok(expanded) => expanded,
            Err(e) => {
                debug!(url = %url, error = %e, "keeping unexpanded url");
                url.to_string()
            }
        }
    }

    async fn resolve_once(&self, url: &str) -> Result<String, ExpandError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ExpandError::Network(format!("request failed: {e}")))?;

        if !response.status().is_redirection() {
            return Ok(url.to_string());
        }

        response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| ExpandError::NoLocation(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expander_creation() {
        let expander = LinkExpander::new(RetryPolicy::default());
        assert!(expander.is_ok());
    }

    #[tokio::test]
    async fn test_expand_or_keep_falls_back_on_failure() {
        let expander = LinkExpander::new(RetryPolicy::new(1, Duration::from_millis(1))).unwrap();
        // Nothing listens here; expansion fails and the input survives.
        let url = "http://127.0.0.1:1/short";
        assert_eq!(expander.expand_or_keep(url).await, url);
    }
}
