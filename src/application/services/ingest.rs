//! Post ingest pipeline.
//!
//! Incoming posts are stored with shortener URLs already expanded, so the
//! renderer never shows a `t.co`-style link.

use std::sync::Arc;

use tracing::info;

use crate::domain::entities::Post;
use crate::domain::ports::{PostStorePort, StoreResult};

use super::link_expander::LinkExpander;
use super::url_rewrite::rewrite_links;

/// Ingests posts into the store, expanding links on the way in.
pub struct PostIngest {
    store: Arc<dyn PostStorePort>,
    expander: Arc<LinkExpander>,
}

impl PostIngest {
    /// Creates the ingest pipeline.
    #[must_use]
    pub fn new(store: Arc<dyn PostStorePort>, expander: Arc<LinkExpander>) -> Self {
        Self { store, expander }
    }

    /// Rewrites links in each post body and persists the post. Returns the
    /// number ingested.
    ///
    /// # Errors
    /// Returns the store error that aborted the batch; posts persisted
    /// before the failure stay persisted.
    pub async fn ingest(&self, posts: Vec<Post>) -> StoreResult<usize> {
        let mut count = 0;
        for mut post in posts {
            post.body = rewrite_links(&post.body, |url| {
                let expander = Arc::clone(&self.expander);
                async move { expander.expand_or_keep(&url).await }
            })
            .await;

            self.store.put(&post).await?;
            count += 1;
        }

        info!(count, "ingested posts");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockPostStorePort;
    use crate::infrastructure::net::RetryPolicy;
    use std::time::Duration;

    fn expander() -> Arc<LinkExpander> {
        Arc::new(LinkExpander::new(RetryPolicy::new(1, Duration::from_millis(1))).unwrap())
    }

    fn post(id: u64, body: &str) -> Post {
        Post::new(id, "Ada", "ada", body, "https://example.com/a.png")
    }

    #[tokio::test]
    async fn test_ingest_persists_every_post() {
        let mut store = MockPostStorePort::new();
        store.expect_put().times(2).returning(|_| Ok(()));

        let ingest = PostIngest::new(Arc::new(store), expander());
        let count = ingest
            .ingest(vec![post(1, "first"), post(2, "second")])
            .await
            .unwrap();

        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_store_failure_aborts_batch() {
        let mut store = MockPostStorePort::new();
        store.expect_put().times(1).returning(|_| {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into())
        });

        let ingest = PostIngest::new(Arc::new(store), expander());
        let result = ingest.ingest(vec![post(1, "first"), post(2, "second")]).await;

        assert!(result.is_err());
    }
}
