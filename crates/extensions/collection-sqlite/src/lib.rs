//! SQLite vector collection for Mnemo.
//!
//! Records persist in a single table keyed by `(user_id, id)`. Vectors are
//! stored as little-endian `f32` blobs and searched by brute force.

mod collection;
mod schema;
mod vector;

pub use collection::SqliteCollection;
