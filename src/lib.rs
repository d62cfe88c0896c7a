//! rwitt - A lightweight desktop timeline client.
//!
//! This crate provides the core of a timeline client: a concurrent,
//! disk-backed remote-image cache with a bounded worker pool, and a
//! bounded, bidirectionally-scrollable window over the post timeline.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing services.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;
/// Presentation layer containing renderer-facing state.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "rwitt";
