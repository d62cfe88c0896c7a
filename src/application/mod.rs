//! Application layer: services operating on domain types.

/// Application services.
pub mod services;

pub use services::{LinkExpander, PostIngest};
