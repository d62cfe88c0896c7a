//! Shared remote-image cache.
//!
//! One mutex guards the entry map and the in-flight set together; lookups
//! hold it only for map bookkeeping, never across I/O. Workers populate
//! the cache in the background and a single inserter task commits their
//! results, so the renderer thread never blocks on an image.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::domain::entities::ImageHandle;
use crate::domain::ports::{CacheError, CacheResult, ImageCachePort};
use crate::infrastructure::net::RetryPolicy;

use super::downloader::{DownloadOutcome, DownloadTask, Worker};

/// Callback invoked from the inserter task whenever a previously missing
/// image becomes available; the renderer schedules a repaint from it.
pub type RedrawFn = Arc<dyn Fn() + Send + Sync>;

/// Default number of download workers.
pub const DEFAULT_WORKERS: usize = 5;

/// Default capacity of the request and result queues.
pub const DEFAULT_QUEUE_CAPACITY: usize = 20;

/// Default bound on installed in-memory entries.
pub const DEFAULT_MAX_ENTRIES: usize = 256;

/// Default per-attempt request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the image cache and its worker pool.
#[derive(Debug, Clone)]
pub struct ImageCacheConfig {
    /// Number of concurrent download workers.
    pub workers: usize,
    /// Capacity of the bounded request queue; lookups that would overflow
    /// it are dropped, not blocked.
    pub queue_capacity: usize,
    /// Maximum installed entries; the least recently used entry is evicted
    /// beyond this.
    pub max_entries: usize,
    /// Retry schedule for network fetches.
    pub retry: RetryPolicy,
    /// Per-attempt timeout, set on the HTTP client.
    pub request_timeout: Duration,
    /// Directory holding the encoded image files.
    pub cache_dir: PathBuf,
}

impl Default for ImageCacheConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_entries: DEFAULT_MAX_ENTRIES,
            retry: RetryPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cache_dir: default_cache_dir(),
        }
    }
}

/// One installed entry. The cache owns the decoded handle until the entry
/// is evicted or the process tears down.
struct CacheEntry {
    local_path: PathBuf,
    handle: ImageHandle,
    last_used: Instant,
}

/// Entry map and in-flight set, guarded together so the
/// miss-check/enqueue transition and the install/clear transition are each
/// atomic.
struct CacheState {
    entries: LruCache<String, CacheEntry>,
    in_flight: HashSet<String>,
}

/// Concurrent, disk-backed cache of remote images.
pub struct ImageCache {
    state: Arc<Mutex<CacheState>>,
    request_tx: mpsc::Sender<DownloadTask>,
    hits: AtomicU64,
    misses: AtomicU64,
    workers: Vec<JoinHandle<()>>,
    inserter: JoinHandle<()>,
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

impl ImageCache {
    /// Creates the cache and spawns its worker pool and inserter.
    ///
    /// Must be called inside a tokio runtime. The redraw callback is
    /// invoked from a background task, once per installed image.
    ///
    /// # Errors
    /// Returns an error if the cache directory cannot be created or the
    /// HTTP client cannot be built.
    pub fn new(config: ImageCacheConfig, redraw: RedrawFn) -> CacheResult<Self> {
        std::fs::create_dir_all(&config.cache_dir)
            .map_err(|e| CacheError::Io(format!("failed to create cache dir: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CacheError::Network(format!("failed to create HTTP client: {e}")))?;

        let (request_tx, request_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (outcome_tx, outcome_rx) = mpsc::channel(config.queue_capacity.max(1));

        let state = Arc::new(Mutex::new(CacheState {
            entries: LruCache::new(
                NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN),
            ),
            in_flight: HashSet::new(),
        }));

        let request_rx = Arc::new(tokio::sync::Mutex::new(request_rx));
        let workers = (0..config.workers)
            .map(|_| {
                tokio::spawn(
                    Worker {
                        rx: Arc::clone(&request_rx),
                        tx: outcome_tx.clone(),
                        client: client.clone(),
                        cache_dir: config.cache_dir.clone(),
                        retry: config.retry,
                    }
                    .run(),
                )
            })
            .collect();
        // The workers hold the only senders now; once they exit, the
        // inserter drains and exits too.
        drop(outcome_tx);

        let inserter = tokio::spawn(run_inserter(outcome_rx, Arc::clone(&state), redraw));

        info!(
            workers = config.workers,
            queue = config.queue_capacity,
            max_entries = config.max_entries,
            dir = %config.cache_dir.display(),
            "image cache started"
        );

        Ok(Self {
            state,
            request_tx,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            workers,
            inserter,
        })
    }

    /// Looks up `url`, scheduling a background download on a miss.
    ///
    /// Never blocks on network or disk I/O, so it is safe to call per
    /// visible post on every repaint. A miss while a download is in flight
    /// is not re-enqueued; a miss against a full request queue is dropped
    /// and may be retried by a later call.
    pub fn get(&self, url: &str) -> Option<ImageHandle> {
        let mut state = self.state.lock();

        if let Some(entry) = state.entries.get_mut(url) {
            entry.last_used = Instant::now();
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(url = %url, "cache hit");
            return Some(Arc::clone(&entry.handle));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);

        if state.in_flight.contains(url) {
            trace!(url = %url, "download already in flight");
            return None;
        }

        match self.request_tx.try_send(DownloadTask {
            url: url.to_string(),
        }) {
            Ok(()) => {
                state.in_flight.insert(url.to_string());
                trace!(url = %url, "download scheduled");
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!(url = %url, "request queue full, dropping");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(url = %url, "request queue closed");
            }
        }

        None
    }

    /// Returns a snapshot of cache counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: state.entries.len(),
            in_flight: state.in_flight.len(),
        }
    }

    /// Number of downloads currently in flight.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    /// Closes the request queue and waits for workers and inserter to
    /// drain. In-flight downloads complete; nothing new is accepted.
    pub async fn shutdown(self) {
        drop(self.request_tx);
        for worker in self.workers {
            let _ = worker.await;
        }
        let _ = self.inserter.await;
        debug!("image cache shut down");
    }
}

impl ImageCachePort for ImageCache {
    fn get(&self, url: &str) -> Option<ImageHandle> {
        Self::get(self, url)
    }

    fn len(&self) -> usize {
        self.state.lock().entries.len()
    }
}

/// Single consumer that commits download outcomes.
///
/// Serializing installs through one task keeps the in-flight-set/map
/// transition atomic and avoids interleaved partial writes.
async fn run_inserter(
    mut rx: mpsc::Receiver<DownloadOutcome>,
    state: Arc<Mutex<CacheState>>,
    redraw: RedrawFn,
) {
    while let Some(outcome) = rx.recv().await {
        match outcome {
            DownloadOutcome::Loaded {
                url,
                local_path,
                handle,
            } => {
                {
                    let mut state = state.lock();
                    state.in_flight.remove(&url);
                    let evicted = state.entries.push(
                        url.clone(),
                        CacheEntry {
                            local_path,
                            handle,
                            last_used: Instant::now(),
                        },
                    );
                    if let Some((evicted_url, entry)) = evicted
                        && evicted_url != url
                    {
                        debug!(
                            url = %evicted_url,
                            path = %entry.local_path.display(),
                            idle_ms = entry.last_used.elapsed().as_millis(),
                            "evicted least recently used entry"
                        );
                    }
                }
                debug!(url = %url, "image installed");
                redraw();
            }
            DownloadOutcome::Failed { url } => {
                state.lock().in_flight.remove(&url);
            }
        }
    }
}

/// Counters describing cache behavior, for logs and tests.
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    /// Lookups answered from the map.
    pub hits: u64,
    /// Lookups that found nothing installed.
    pub misses: u64,
    /// Installed entries.
    pub entries: usize,
    /// Downloads currently in flight.
    pub in_flight: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} entries, {} in flight ({} hits, {} misses)",
            self.entries, self.in_flight, self.hits, self.misses
        )
    }
}

/// Default image directory under the project cache dir.
fn default_cache_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "rwitt", "rwitt").map_or_else(
        || std::env::temp_dir().join("rwitt").join("images"),
        |dirs| dirs.cache_dir().join("images"),
    )
}
