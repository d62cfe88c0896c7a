use crate::domain::entities::PostId;

/// Errors returned by timeline window operations.
///
/// These are caller errors: the window is left unchanged when one is
/// returned. Internal invariant failures are not represented here; those
/// panic immediately instead of being absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimelineError {
    /// An insert would break the strictly-increasing id order of the chain.
    #[error("post {candidate} violates ordering against window bound {bound}")]
    OrderingViolation {
        /// Id of the rejected post.
        candidate: PostId,
        /// Id of the terminal node the candidate was compared against.
        bound: PostId,
    },

    /// A cursor move would walk past a terminal node.
    #[error("cannot move center by {delta}: only {available} nodes available in that direction")]
    BoundaryViolation {
        /// Requested displacement.
        delta: isize,
        /// How many steps were actually available before the terminal.
        available: usize,
    },

    /// An operation that requires a seeded window was called on an empty one.
    #[error("timeline window is empty")]
    Empty,
}
