//! Presentation layer: state the renderer paints from.
//!
//! The renderer itself is an external collaborator; it reads the timeline
//! window, queries the image cache per visible post, and repaints when the
//! cache fires the redraw callback.

/// Timeline view-model state.
pub mod timeline;

pub use timeline::{TimelineWindow, WindowPost};
