//! URL handling module
//!
//! This module provides link resolution against the page a link was found
//! on, query stripping for media references, and derivation of archive
//! entry names from asset URLs.

mod filename;
mod resolve;

// Re-export main functions
pub use filename::file_name_for;
pub use resolve::{dedup_preserving_order, normalize_url, resolve_link, strip_query};
