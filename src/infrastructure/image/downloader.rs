//! Download worker pool.
//!
//! A fixed number of workers share one request queue. Each worker resolves
//! a URL from disk when possible and falls back to the network with
//! bounded retries, then hands the decoded result to the cache inserter.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tokio::fs;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, trace, warn};

use crate::domain::entities::ImageHandle;
use crate::domain::ports::{CacheError, CacheResult};
use crate::infrastructure::net::RetryPolicy;

use super::path_resolver::resolve;

/// A queued request for one remote image.
#[derive(Debug)]
pub(super) struct DownloadTask {
    /// Remote URL to resolve.
    pub url: String,
}

/// Terminal result of a download task, consumed exactly once by the
/// inserter.
pub(super) enum DownloadOutcome {
    /// The image was resolved and decoded.
    Loaded {
        /// Requested URL.
        url: String,
        /// Resolver-determined path the encoded image lives at.
        local_path: PathBuf,
        /// Decoded bitmap.
        handle: ImageHandle,
    },
    /// Retries were exhausted; the inserter clears the in-flight mark so a
    /// later lookup can start over.
    Failed {
        /// Requested URL.
        url: String,
    },
}

/// One worker of the pool.
pub(super) struct Worker {
    pub rx: Arc<tokio::sync::Mutex<mpsc::Receiver<DownloadTask>>>,
    pub tx: mpsc::Sender<DownloadOutcome>,
    pub client: reqwest::Client,
    pub cache_dir: PathBuf,
    pub retry: RetryPolicy,
}

impl Worker {
    /// Worker loop: dequeue, resolve, emit. Exits when the request queue
    /// closes or the inserter goes away.
    pub async fn run(self) {
        loop {
            let task = {
                let mut rx = self.rx.lock().await;
                rx.recv().await
            };
            let Some(task) = task else { break };

            let outcome = self.resolve_task(task.url).await;
            if self.tx.send(outcome).await.is_err() {
                break;
            }
        }
    }

    /// Resolves one URL: disk first, then network with retries.
    async fn resolve_task(&self, url: String) -> DownloadOutcome {
        let local_path = resolve(&self.cache_dir, &url);

        match fs::read(&local_path).await {
            Ok(bytes) => match decode(Bytes::from(bytes)).await {
                Ok(handle) => {
                    trace!(url = %url, path = %local_path.display(), "resolved from disk");
                    return DownloadOutcome::Loaded {
                        url,
                        local_path,
                        handle,
                    };
                }
                Err(e) => {
                    // Stale or corrupt file; a fresh fetch overwrites it.
                    warn!(url = %url, error = %e, "cached file undecodable, refetching");
                }
            },
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                warn!(url = %url, error = %e, "cached file unreadable, refetching");
            }
            Err(_) => {}
        }

        match self.fetch_with_retry(&url, &local_path).await {
            Ok(handle) => DownloadOutcome::Loaded {
                url,
                local_path,
                handle,
            },
            Err(e) => {
                warn!(url = %url, error = %e, "retries exhausted, dropping request");
                DownloadOutcome::Failed { url }
            }
        }
    }

    /// Fetches and decodes under the retry policy, persisting the canonical
    /// PNG on success.
    async fn fetch_with_retry(&self, url: &str, local_path: &Path) -> CacheResult<ImageHandle> {
        debug!(url = %url, "downloading");

        let mut delays = self.retry.delays();
        let mut last_err = CacheError::Network("no attempts configured".to_string());

        for attempt in 1..=self.retry.max_attempts {
            match self.fetch_once(url).await {
                Ok((handle, png)) => {
                    // Idempotent re-write; a failed write still leaves the
                    // decoded image usable.
                    if let Err(e) = fs::write(local_path, &png).await {
                        warn!(url = %url, path = %local_path.display(), error = %e,
                            "failed to persist image");
                    }
                    return Ok(handle);
                }
                Err(e) => {
                    warn!(url = %url, attempt, error = %e, "download attempt failed");
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

    /// Performs one GET and decodes the payload, also producing the
    /// canonical PNG encoding for persistence.
    async fn fetch_once(&self, url: &str) -> CacheResult<(ImageHandle, Vec<u8>)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CacheError::Network(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CacheError::Network(format!("HTTP {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CacheError::Network(format!("failed to read body: {e}")))?;

        decode_and_canonicalize(bytes).await
    }
}

/// Decodes raw image bytes off the async runtime.
async fn decode(bytes: Bytes) -> CacheResult<ImageHandle> {
    let img = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| CacheError::Decode(format!("decode task panicked: {e}")))?
        .map_err(|e| CacheError::Decode(format!("failed to decode image: {e}")))?;
    Ok(Arc::new(img))
}

/// Decodes raw bytes and re-encodes the bitmap as canonical PNG.
async fn decode_and_canonicalize(bytes: Bytes) -> CacheResult<(ImageHandle, Vec<u8>)> {
    tokio::task::spawn_blocking(move || -> Result<_, image::ImageError> {
        let img = image::load_from_memory(&bytes)?;
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
        Ok((Arc::new(img), png))
    })
    .await
    .map_err(|e| CacheError::Decode(format!("decode task panicked: {e}")))?
    .map_err(|e| CacheError::Decode(format!("failed to decode image: {e}")))
}
