//! # Mnemo Facts
//!
//! User-scoped, versioned fact storage on top of the request coordinator,
//! the hybrid scorer and a pluggable vector collection.

mod filters;
mod record;
mod store;

pub use filters::to_metadata_filter;
pub use store::FactStore;
