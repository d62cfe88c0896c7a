//! Infrastructure layer: adapters for external services.

/// Configuration loading and CLI arguments.
pub mod config;
/// Remote-image cache, worker pool, and path resolution.
pub mod image;
/// Shared networking utilities.
pub mod net;
/// Durable storage adapters.
pub mod store;

pub use config::{AppConfig, CliArgs};
pub use image::{ImageCache, ImageCacheConfig};
pub use store::JsonPostStore;
