//! Bounded, bidirectionally-scrollable window over the post timeline.
//!
//! The window is a doubly-linked chain of nodes held in an arena and
//! addressed by stable indices, so the links are plain `Option<usize>`
//! with no ownership cycles. A free list recycles indices on eviction,
//! and evicted nodes return their [`RenderLayout`] to the pool.
//!
//! Single-writer: the control thread owns the window. It is not safe to
//! share across threads without an external lock.

use tracing::trace;

use crate::domain::entities::{Post, PostId};
use crate::domain::errors::TimelineError;

use super::layout::{LayoutPool, RenderLayout};

/// One post in the window.
#[derive(Debug)]
struct Node {
    id: PostId,
    body: String,
    image_url: String,
    older: Option<usize>,
    newer: Option<usize>,
    layout: RenderLayout,
}

/// A post as seen through the window.
#[derive(Debug, Clone, Copy)]
pub struct WindowPost<'a> {
    /// Post id.
    pub id: PostId,
    /// Post body text.
    pub body: &'a str,
    /// Remote URL of the author image.
    pub image_url: &'a str,
    /// Composed display text.
    pub layout: &'a str,
}

/// Bounded window of posts around a scroll cursor.
///
/// Holds at most `max_per_side` posts added on each side of the center.
/// Inserts keep the chain strictly increasing by id; an insert that would
/// break the order is rejected and leaves the window untouched.
#[derive(Debug)]
pub struct TimelineWindow {
    arena: Vec<Option<Node>>,
    free: Vec<usize>,
    max_per_side: usize,
    center: Option<usize>,
    oldest: Option<usize>,
    newest: Option<usize>,
    older_count: usize,
    newer_count: usize,
    layouts: LayoutPool,
}

impl TimelineWindow {
    /// Creates an empty window holding up to `max_per_side` posts on each
    /// side of the center.
    ///
    /// # Panics
    /// Panics if `max_per_side` is zero.
    #[must_use]
    pub fn new(max_per_side: usize) -> Self {
        assert!(max_per_side > 0, "window must hold at least one post per side");
        Self {
            arena: Vec::new(),
            free: Vec::new(),
            max_per_side,
            center: None,
            oldest: None,
            newest: None,
            older_count: 0,
            newer_count: 0,
            layouts: LayoutPool::new(),
        }
    }

    /// Resets the window to a single node holding `post`, which becomes
    /// the center. Existing nodes are evicted and their layouts recycled.
    pub fn seed(&mut self, post: &Post) {
        self.clear();
        let idx = self.alloc(post);
        self.center = Some(idx);
        self.oldest = Some(idx);
        self.newest = Some(idx);
        trace!(id = %post.id, "window seeded");
    }

    /// Appends a strictly newer post at the newest end. An empty window is
    /// seeded instead. Evicts from the oldest end past the bound.
    ///
    /// # Errors
    /// [`TimelineError::OrderingViolation`] if `post.id` is not greater
    /// than the current newest id; the window is unchanged.
    pub fn add_newer(&mut self, post: &Post) -> Result<(), TimelineError> {
        let Some(newest) = self.newest else {
            self.seed(post);
            return Ok(());
        };

        let bound = self.node(newest).id;
        if post.id <= bound {
            return Err(TimelineError::OrderingViolation {
                candidate: post.id,
                bound,
            });
        }

        let idx = self.alloc(post);
        self.node_mut(idx).older = Some(newest);
        self.node_mut(newest).newer = Some(idx);
        self.newest = Some(idx);

        self.newer_count += 1;
        if self.newer_count > self.max_per_side {
            self.evict_oldest();
        }

        debug_assert!(self.newer_count <= self.max_per_side);
        debug_assert!(self.older_count <= self.max_per_side);
        Ok(())
    }

    /// Prepends a strictly older post at the oldest end. An empty window
    /// is seeded instead. Evicts from the newest end past the bound.
    ///
    /// # Errors
    /// [`TimelineError::OrderingViolation`] if `post.id` is not less than
    /// the current oldest id; the window is unchanged.
    pub fn add_older(&mut self, post: &Post) -> Result<(), TimelineError> {
        let Some(oldest) = self.oldest else {
            self.seed(post);
            return Ok(());
        };

        let bound = self.node(oldest).id;
        if post.id >= bound {
            return Err(TimelineError::OrderingViolation {
                candidate: post.id,
                bound,
            });
        }

        let idx = self.alloc(post);
        self.node_mut(idx).newer = Some(oldest);
        self.node_mut(oldest).older = Some(idx);
        self.oldest = Some(idx);

        self.older_count += 1;
        if self.older_count > self.max_per_side {
            self.evict_newest();
        }

        debug_assert!(self.newer_count <= self.max_per_side);
        debug_assert!(self.older_count <= self.max_per_side);
        Ok(())
    }

    /// Moves the center `delta` posts toward newer (positive) or older
    /// (negative). The move is all-or-nothing.
    ///
    /// # Errors
    /// [`TimelineError::BoundaryViolation`] if the walk would pass a
    /// terminal node; the center is unchanged. [`TimelineError::Empty`] on
    /// an unseeded window.
    pub fn move_center(&mut self, delta: isize) -> Result<(), TimelineError> {
        let Some(mut cursor) = self.center else {
            return Err(TimelineError::Empty);
        };

        let mut taken = 0usize;
        let mut remaining = delta;
        while remaining > 0 {
            let Some(newer) = self.node(cursor).newer else {
                return Err(TimelineError::BoundaryViolation {
                    delta,
                    available: taken,
                });
            };
            cursor = newer;
            remaining -= 1;
            taken += 1;
        }
        while remaining < 0 {
            let Some(older) = self.node(cursor).older else {
                return Err(TimelineError::BoundaryViolation {
                    delta,
                    available: taken,
                });
            };
            cursor = older;
            remaining += 1;
            taken += 1;
        }

        self.center = Some(cursor);
        Ok(())
    }

    /// Id of the center post, once seeded.
    #[must_use]
    pub fn center_id(&self) -> Option<PostId> {
        self.center.map(|idx| self.node(idx).id)
    }

    /// Id of the oldest post in the window.
    #[must_use]
    pub fn oldest_id(&self) -> Option<PostId> {
        self.oldest.map(|idx| self.node(idx).id)
    }

    /// Id of the newest post in the window.
    #[must_use]
    pub fn newest_id(&self) -> Option<PostId> {
        self.newest.map(|idx| self.node(idx).id)
    }

    /// Number of posts currently in the window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len() - self.free.len()
    }

    /// True if the window holds no posts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Posts added on the older side since the last seed, net of eviction.
    #[must_use]
    pub fn older_count(&self) -> usize {
        self.older_count
    }

    /// Posts added on the newer side since the last seed, net of eviction.
    #[must_use]
    pub fn newer_count(&self) -> usize {
        self.newer_count
    }

    /// Number of layouts waiting in the recycle pool.
    #[must_use]
    pub fn recycled_layouts(&self) -> usize {
        self.layouts.len()
    }

    /// Iterates the window oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = WindowPost<'_>> {
        WindowIter {
            window: self,
            next: self.oldest,
        }
    }

    /// Evicts every node, recycling all layouts.
    pub fn clear(&mut self) {
        let mut cursor = self.oldest;
        while let Some(idx) = cursor {
            cursor = self.node(idx).newer;
            self.release(idx);
        }
        self.center = None;
        self.oldest = None;
        self.newest = None;
        self.older_count = 0;
        self.newer_count = 0;
    }

    /// Removes the oldest node after an `add_newer` overflow.
    fn evict_oldest(&mut self) {
        let oldest = self.oldest.expect("eviction on an empty window");
        let next = self
            .node(oldest)
            .newer
            .expect("eviction would empty the window");
        self.node_mut(next).older = None;
        self.oldest = Some(next);

        if self.center == Some(oldest) {
            // The older side is exhausted and the cursor sits on the node
            // being evicted; it rides along to the new oldest.
            assert!(
                self.older_count == 0,
                "center at the oldest node with a nonempty older side"
            );
            assert!(self.newer_count > 0, "newer-side count underflow on eviction");
            self.newer_count -= 1;
            self.center = Some(next);
        } else {
            assert!(self.older_count > 0, "older-side count underflow on eviction");
            self.older_count -= 1;
        }

        trace!(id = %self.node(oldest).id, "evicted oldest");
        self.release(oldest);
    }

    /// Removes the newest node after an `add_older` overflow.
    fn evict_newest(&mut self) {
        let newest = self.newest.expect("eviction on an empty window");
        let prev = self
            .node(newest)
            .older
            .expect("eviction would empty the window");
        self.node_mut(prev).newer = None;
        self.newest = Some(prev);

        if self.center == Some(newest) {
            assert!(
                self.newer_count == 0,
                "center at the newest node with a nonempty newer side"
            );
            assert!(self.older_count > 0, "older-side count underflow on eviction");
            self.older_count -= 1;
            self.center = Some(prev);
        } else {
            assert!(self.newer_count > 0, "newer-side count underflow on eviction");
            self.newer_count -= 1;
        }

        trace!(id = %self.node(newest).id, "evicted newest");
        self.release(newest);
    }

    /// Creates a node for `post`, reusing a free arena slot and a pooled
    /// layout when available.
    fn alloc(&mut self, post: &Post) -> usize {
        let mut layout = self.layouts.acquire();
        layout.compose(post);
        let node = Node {
            id: post.id,
            body: post.body.clone(),
            image_url: post.avatar_url.clone(),
            older: None,
            newer: None,
            layout,
        };

        if let Some(idx) = self.free.pop() {
            debug_assert!(self.arena[idx].is_none(), "free list points at a live slot");
            self.arena[idx] = Some(node);
            idx
        } else {
            self.arena.push(Some(node));
            self.arena.len() - 1
        }
    }

    /// Destroys the node at `idx`, recycling its layout and slot.
    fn release(&mut self, idx: usize) {
        let node = self.arena[idx]
            .take()
            .expect("releasing a vacant arena slot");
        self.layouts.recycle(node.layout);
        self.free.push(idx);
    }

    fn node(&self, idx: usize) -> &Node {
        self.arena[idx].as_ref().expect("chain points at a vacant slot")
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node {
        self.arena[idx].as_mut().expect("chain points at a vacant slot")
    }
}

struct WindowIter<'a> {
    window: &'a TimelineWindow,
    next: Option<usize>,
}

impl<'a> Iterator for WindowIter<'a> {
    type Item = WindowPost<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;
        let node = self.window.node(idx);
        self.next = node.newer;
        Some(WindowPost {
            id: node.id,
            body: &node.body,
            image_url: &node.image_url,
            layout: node.layout.text(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn post(id: u64) -> Post {
        Post::new(
            id,
            format!("user{id}"),
            format!("u{id}"),
            format!("post {id}"),
            format!("https://example.com/u{id}.png"),
        )
    }

    fn ids(window: &TimelineWindow) -> Vec<u64> {
        window.iter().map(|p| p.id.as_u64()).collect()
    }

    #[test]
    fn test_first_add_newer_seeds_center() {
        let mut window = TimelineWindow::new(5);
        window.add_newer(&post(1)).unwrap();
        assert_eq!(window.center_id(), Some(PostId(1)));
        assert_eq!(window.oldest_id(), Some(PostId(1)));
        assert_eq!(window.newest_id(), Some(PostId(1)));
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_chain_stays_strictly_increasing() {
        let mut window = TimelineWindow::new(5);
        for id in [10u64, 20, 30] {
            window.add_newer(&post(id)).unwrap();
        }
        window.add_older(&post(5)).unwrap();
        assert_eq!(ids(&window), vec![5, 10, 20, 30]);
    }

    #[test]
    fn test_add_newer_rejects_out_of_order_ids() {
        let mut window = TimelineWindow::new(5);
        window.add_newer(&post(10)).unwrap();
        window.add_newer(&post(20)).unwrap();

        for bad in [20u64, 15, 1] {
            let err = window.add_newer(&post(bad)).unwrap_err();
            assert_eq!(
                err,
                TimelineError::OrderingViolation {
                    candidate: PostId(bad),
                    bound: PostId(20),
                }
            );
        }
        // Rejected inserts leave the chain untouched.
        assert_eq!(ids(&window), vec![10, 20]);
        assert_eq!(window.newer_count(), 1);
    }

    #[test]
    fn test_add_older_rejects_out_of_order_ids() {
        let mut window = TimelineWindow::new(5);
        window.add_newer(&post(10)).unwrap();
        window.add_older(&post(5)).unwrap();

        assert!(window.add_older(&post(5)).is_err());
        assert!(window.add_older(&post(7)).is_err());
        assert_eq!(ids(&window), vec![5, 10]);
    }

    #[test_case(1)]
    #[test_case(3)]
    #[test_case(10)]
    fn test_side_counts_stay_bounded(max_per_side: usize) {
        let mut window = TimelineWindow::new(max_per_side);
        for id in 1..=40u64 {
            window.add_newer(&post(id)).unwrap();
            assert!(window.newer_count() <= max_per_side);
            assert!(window.older_count() <= max_per_side);
        }
        for id in (41..=80u64).rev() {
            // Reseed so there is room on the older side.
            if id == 80 {
                window.seed(&post(id));
                continue;
            }
            window.add_older(&post(id)).unwrap();
            assert!(window.newer_count() <= max_per_side);
            assert!(window.older_count() <= max_per_side);
        }
    }

    #[test]
    fn test_scroll_window_follows_add_newer_stream() {
        let mut window = TimelineWindow::new(10);
        for id in 1..=21u64 {
            window.add_newer(&post(id)).unwrap();
        }
        assert_eq!(ids(&window), (11..=21).collect::<Vec<_>>());
        assert_eq!(window.oldest_id(), Some(PostId(11)));
        assert_eq!(window.newest_id(), Some(PostId(21)));
        assert_eq!(window.center_id(), Some(PostId(11)));
        assert_eq!(window.len(), 11);
    }

    #[test]
    fn test_add_older_evicts_newest_past_bound() {
        let mut window = TimelineWindow::new(3);
        window.seed(&post(100));
        for id in (96..=99u64).rev() {
            window.add_older(&post(id)).unwrap();
        }
        assert_eq!(ids(&window), vec![96, 97, 98, 99]);
        assert_eq!(window.newest_id(), Some(PostId(99)));
        // The center rode along when the node under it was evicted.
        assert_eq!(window.center_id(), Some(PostId(99)));
    }

    #[test]
    fn test_move_center_walks_both_directions() {
        let mut window = TimelineWindow::new(10);
        for id in 1..=5u64 {
            window.add_newer(&post(id)).unwrap();
        }

        window.move_center(3).unwrap();
        assert_eq!(window.center_id(), Some(PostId(4)));
        window.move_center(-2).unwrap();
        assert_eq!(window.center_id(), Some(PostId(2)));
    }

    #[test]
    fn test_move_center_past_terminal_is_rejected() {
        let mut window = TimelineWindow::new(10);
        for id in 1..=3u64 {
            window.add_newer(&post(id)).unwrap();
        }

        let err = window.move_center(5).unwrap_err();
        assert_eq!(
            err,
            TimelineError::BoundaryViolation {
                delta: 5,
                available: 2,
            }
        );
        // Failed moves leave the cursor where it was.
        assert_eq!(window.center_id(), Some(PostId(1)));

        let err = window.move_center(-1).unwrap_err();
        assert_eq!(
            err,
            TimelineError::BoundaryViolation {
                delta: -1,
                available: 0,
            }
        );
        assert_eq!(window.center_id(), Some(PostId(1)));
    }

    #[test]
    fn test_move_center_on_empty_window() {
        let mut window = TimelineWindow::new(3);
        assert_eq!(window.move_center(1), Err(TimelineError::Empty));
    }

    #[test]
    fn test_each_eviction_recycles_exactly_one_layout() {
        let mut window = TimelineWindow::new(2);
        for id in 1..=3u64 {
            window.add_newer(&post(id)).unwrap();
        }
        assert_eq!(window.recycled_layouts(), 0);

        // Every insert past the bound evicts once; the alloc reuses the
        // pooled layout, so the pool toggles instead of growing.
        window.add_newer(&post(4)).unwrap();
        assert_eq!(window.recycled_layouts(), 1);
        window.add_newer(&post(5)).unwrap();
        assert_eq!(window.recycled_layouts(), 1);
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_arena_slots_are_reused_after_eviction() {
        let mut window = TimelineWindow::new(1);
        for id in 1..=50u64 {
            window.add_newer(&post(id)).unwrap();
        }
        // Bound of one per side keeps the chain at two nodes; the arena
        // only ever grew by one extra slot for the insert-then-evict.
        assert_eq!(window.len(), 2);
        assert_eq!(ids(&window), vec![49, 50]);
    }

    #[test]
    fn test_evicted_id_can_be_reinserted() {
        let mut window = TimelineWindow::new(1);
        for id in 1..=4u64 {
            window.add_newer(&post(id)).unwrap();
        }
        assert_eq!(ids(&window), vec![3, 4]);

        // Id 2 left the window; inserting it again is a fresh node.
        window.add_older(&post(2)).unwrap();
        assert_eq!(ids(&window), vec![2, 3, 4]);
    }

    #[test]
    fn test_seed_resets_and_recycles() {
        let mut window = TimelineWindow::new(5);
        for id in 1..=4u64 {
            window.add_newer(&post(id)).unwrap();
        }

        window.seed(&post(100));
        assert_eq!(ids(&window), vec![100]);
        assert_eq!(window.center_id(), Some(PostId(100)));
        assert_eq!(window.older_count(), 0);
        assert_eq!(window.newer_count(), 0);
        assert_eq!(window.recycled_layouts(), 4);
    }

    #[test]
    fn test_iter_exposes_layout_text() {
        let mut window = TimelineWindow::new(3);
        window.add_newer(&post(1)).unwrap();
        let entry = window.iter().next().unwrap();
        assert!(entry.layout.contains("user1 @u1"));
        assert_eq!(entry.image_url, "https://example.com/u1.png");
    }
}
