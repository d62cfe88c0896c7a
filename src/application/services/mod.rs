//! Application services.

mod ingest;
mod link_expander;
/// URL detection and rewriting inside post bodies.
pub mod url_rewrite;

pub use ingest::PostIngest;
pub use link_expander::{ExpandError, LinkExpander};
pub use url_rewrite::{extract_links, rewrite_links};
