//! Timeline view-model state.

mod layout;
mod window;

pub use layout::{LayoutPool, RenderLayout};
pub use window::{TimelineWindow, WindowPost};
