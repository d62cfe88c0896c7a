use std::sync::Arc;

/// Shared handle to a decoded bitmap.
///
/// Cloning is cheap; the pixels live behind the `Arc` and are owned by the
/// image cache until the entry is evicted.
pub type ImageHandle = Arc<image::DynamicImage>;
