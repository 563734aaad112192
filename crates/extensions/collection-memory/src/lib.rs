//! Mnemo extension: in-process vector collection.
//!
//! Records live in memory, partitioned by user, and are searched by brute
//! force. Nothing survives a restart.

mod collection;

pub use collection::MemoryCollection;
