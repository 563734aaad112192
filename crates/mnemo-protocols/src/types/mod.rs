//! Common types shared across the protocol definitions.

mod common;

pub use common::*;
