//! Mnemo extension: embedding backends.
//!
//! - [`OpenAIEmbedding`] calls an OpenAI-compatible `/embeddings` endpoint.
//! - [`HashingEmbedding`] hashes words and character trigrams into a fixed
//!   dimension; deterministic and offline.

mod hashing;
mod openai;

pub use hashing::HashingEmbedding;
pub use openai::{OpenAIEmbedding, OpenAIEmbeddingConfig};
