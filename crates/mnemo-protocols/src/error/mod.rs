//! Error types for the Mnemo protocol layer.

mod collection;
mod coordinator;
mod embedding;
mod store;

pub use collection::*;
pub use coordinator::*;
pub use embedding::*;
pub use store::*;
