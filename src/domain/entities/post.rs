use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a timeline post.
///
/// Ids are monotonically comparable: a larger id is a newer post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PostId(pub u64);

impl PostId {
    /// Returns the underlying u64 value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PostId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A single timeline post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Post id, strictly increasing with recency.
    pub id: PostId,
    /// Display name of the author.
    pub author_name: String,
    /// Short handle of the author, without the leading `@`.
    pub author_handle: String,
    /// Post body text.
    pub body: String,
    /// Remote URL of the author's profile image.
    pub avatar_url: String,
    /// Number of favorites.
    #[serde(default)]
    pub favorite_count: u32,
    /// Number of reposts.
    #[serde(default)]
    pub repost_count: u32,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Creates a post with zeroed counters, timestamped now.
    #[must_use]
    pub fn new(
        id: impl Into<PostId>,
        author_name: impl Into<String>,
        author_handle: impl Into<String>,
        body: impl Into<String>,
        avatar_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            author_name: author_name.into(),
            author_handle: author_handle.into(),
            body: body.into(),
            avatar_url: avatar_url.into(),
            favorite_count: 0,
            repost_count: 0,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_id_ordering() {
        assert!(PostId(2) > PostId(1));
        assert_eq!(PostId::from(7).as_u64(), 7);
    }

    #[test]
    fn test_post_serde_round_trip() {
        let post = Post::new(42u64, "Ada", "ada", "hello", "https://example.com/a.png");
        let json = serde_json::to_string(&post).unwrap();
        let back: Post = serde_json::from_str(&json).unwrap();
        assert_eq!(back, post);
    }

    #[test]
    fn test_counters_default_when_absent() {
        let json = r#"{
            "id": 1,
            "author_name": "Ada",
            "author_handle": "ada",
            "body": "hi",
            "avatar_url": "https://example.com/a.png",
            "created_at": "2024-01-01T00:00:00Z"
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.favorite_count, 0);
        assert_eq!(post.repost_count, 0);
    }
}
