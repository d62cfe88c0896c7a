//! Durable storage adapters.

mod post_store;

pub use post_store::JsonPostStore;
