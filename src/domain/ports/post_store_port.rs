//! Port definition for durable post storage.

use crate::domain::entities::Post;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while reading or writing the post store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error against the backing file.
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    /// Stored data could not be (de)serialized.
    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Port for ordered, durable post records.
///
/// Posts are keyed by their monotonically comparable id; consumers never
/// depend on the adapter's on-disk format.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PostStorePort: Send + Sync {
    /// Returns up to `limit` most recent posts, newest first.
    async fn recent(&self, limit: usize) -> StoreResult<Vec<Post>>;

    /// Persists a post, replacing any record with the same id.
    async fn put(&self, post: &Post) -> StoreResult<()>;
}
