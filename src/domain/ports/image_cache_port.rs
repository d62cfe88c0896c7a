//! Port definition for the remote-image cache.

use crate::domain::entities::ImageHandle;

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Errors that can occur while populating the cache.
///
/// All of these are transient from the renderer's point of view: they stay
/// inside the background workers' retry loops and are never returned from
/// a lookup.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// Failed to decode an image payload.
    #[error("decode error: {0}")]
    Decode(String),
    /// I/O error while reading or writing the disk cache.
    #[error("io error: {0}")]
    Io(String),
    /// Network error during download.
    #[error("network error: {0}")]
    Network(String),
}

/// Renderer-facing seam of the image cache.
///
/// Implementations must be callable from the UI thread: a lookup never
/// blocks on network or disk I/O. A miss schedules background population
/// and reports readiness later through the redraw callback supplied at
/// construction, after which the same lookup returns a hit.
pub trait ImageCachePort: Send + Sync {
    /// Returns the cached handle for `url`, or `None` if not (yet) ready.
    ///
    /// A miss enqueues a download request unless one is already in flight
    /// or the request queue is full; either way the call returns
    /// immediately.
    fn get(&self, url: &str) -> Option<ImageHandle>;

    /// Returns the number of installed entries.
    fn len(&self) -> usize;

    /// Returns true if no entries are installed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
