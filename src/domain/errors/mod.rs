//! Domain error types.

mod timeline_error;

pub use timeline_error::TimelineError;
