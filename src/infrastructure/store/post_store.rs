//! JSON-file-backed post store.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::entities::{Post, PostId};
use crate::domain::ports::{PostStorePort, StoreResult};

/// Durable post records, ordered by id.
///
/// Posts live in an id-keyed map mirrored to a JSON file; every `put`
/// rewrites the file. Fine for timeline-sized data, and consumers only see
/// the [`PostStorePort`] contract.
pub struct JsonPostStore {
    path: PathBuf,
    posts: RwLock<BTreeMap<PostId, Post>>,
}

impl JsonPostStore {
    /// Opens the store at `path`, loading any existing records. A missing
    /// file yields an empty store.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be read or parsed.
    pub async fn open(path: PathBuf) -> StoreResult<Self> {
        let posts = match fs::read_to_string(&path).await {
            Ok(content) => {
                let records: Vec<Post> = serde_json::from_str(&content)?;
                records.into_iter().map(|p| (p.id, p)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), posts = posts.len(), "post store opened");

        Ok(Self {
            path,
            posts: RwLock::new(posts),
        })
    }

    /// Opens the store in the default location under the project data dir.
    ///
    /// # Errors
    /// Returns an error if an existing store file cannot be read or parsed.
    pub async fn open_default() -> StoreResult<Self> {
        Self::open(default_store_path()).await
    }

    /// Number of stored posts.
    pub async fn len(&self) -> usize {
        self.posts.read().await.len()
    }

    /// True if no posts are stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Writes the current record set to disk.
    async fn persist(&self, posts: &BTreeMap<PostId, Post>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let records: Vec<&Post> = posts.values().collect();
        let content = serde_json::to_vec_pretty(&records)?;
        fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl PostStorePort for JsonPostStore {
    async fn recent(&self, limit: usize) -> StoreResult<Vec<Post>> {
        let posts = self.posts.read().await;
        Ok(posts.values().rev().take(limit).cloned().collect())
    }

    async fn put(&self, post: &Post) -> StoreResult<()> {
        let mut posts = self.posts.write().await;
        if posts.insert(post.id, post.clone()).is_some() {
            debug!(id = %post.id, "replaced stored post");
        }
        self.persist(&posts).await
    }
}

/// Default store file under the project data directory.
fn default_store_path() -> PathBuf {
    directories::ProjectDirs::from("com", "rwitt", "rwitt").map_or_else(
        || {
            warn!("failed to determine project directories, storing posts under the temp dir");
            std::env::temp_dir().join("rwitt").join("posts.json")
        },
        |dirs| dirs.data_dir().join("posts.json"),
    )
}
