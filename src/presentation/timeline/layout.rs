//! Reusable render layouts.
//!
//! Composing a post's display text allocates; scrolling churns through
//! posts fast enough that those buffers are worth recycling. Evicted
//! nodes hand their layout back to the pool, and the pool is consulted
//! first whenever a new node needs one.

use std::fmt::Write as _;

use crate::domain::entities::Post;

/// Composed display text for one post, ready for the renderer to shape.
#[derive(Debug, Default)]
pub struct RenderLayout {
    text: String,
}

impl RenderLayout {
    /// Fills the layout from a post, replacing previous content.
    pub fn compose(&mut self, post: &Post) {
        self.text.clear();
        let _ = write!(
            self.text,
            "{} @{}\n{}",
            post.author_name, post.author_handle, post.body
        );
        if post.favorite_count > 0 || post.repost_count > 0 {
            let _ = write!(
                self.text,
                "\n\u{2764} {}  \u{21c4} {}",
                post.favorite_count, post.repost_count
            );
        }
    }

    /// Composed text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Clears content, keeping the allocation.
    fn reset(&mut self) {
        self.text.clear();
    }
}

/// Pool of recycled layouts.
#[derive(Debug, Default)]
pub struct LayoutPool {
    free: Vec<RenderLayout>,
}

impl LayoutPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pops a recycled layout, or allocates a fresh one.
    #[must_use]
    pub fn acquire(&mut self) -> RenderLayout {
        self.free.pop().unwrap_or_default()
    }

    /// Clears a layout and returns it to the pool.
    pub fn recycle(&mut self, mut layout: RenderLayout) {
        layout.reset();
        self.free.push(layout);
    }

    /// Number of layouts waiting for reuse.
    #[must_use]
    pub fn len(&self) -> usize {
        self.free.len()
    }

    /// True if nothing is waiting for reuse.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> Post {
        let mut p = Post::new(1u64, "Ada Lovelace", "ada", "first program", "https://x/a.png");
        p.favorite_count = 3;
        p
    }

    #[test]
    fn test_compose_includes_author_and_body() {
        let mut layout = RenderLayout::default();
        layout.compose(&post());
        assert!(layout.text().starts_with("Ada Lovelace @ada\n"));
        assert!(layout.text().contains("first program"));
        assert!(layout.text().contains("\u{2764} 3"));
    }

    #[test]
    fn test_compose_replaces_previous_content() {
        let mut layout = RenderLayout::default();
        layout.compose(&post());
        let other = Post::new(2u64, "Grace", "gh", "short", "https://x/g.png");
        layout.compose(&other);
        assert!(!layout.text().contains("Ada"));
        assert!(layout.text().contains("Grace"));
    }

    #[test]
    fn test_pool_recycles_before_allocating() {
        let mut pool = LayoutPool::new();
        assert!(pool.is_empty());

        let mut layout = pool.acquire();
        layout.compose(&post());
        pool.recycle(layout);
        assert_eq!(pool.len(), 1);

        let reused = pool.acquire();
        assert!(pool.is_empty());
        // Recycled layouts come back empty.
        assert!(reused.text().is_empty());
    }
}
