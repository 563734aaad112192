//! Offline feature-hashing embeddings.
//!
//! Each lowercase word and each of its boundary-marked character trigrams is
//! hashed into one of `dimension` buckets; the bucket counts are L2
//! normalized. All components are non-negative, so cosine similarity between
//! any two texts lies in [0, 1]. Not semantic, but texts sharing words or word
//! stems land close together.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use mnemo_protocols::{Embedding, EmbeddingBackend, EmbeddingError};

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Deterministic bag-of-features embedding backend.
#[derive(Debug, Clone)]
pub struct HashingEmbedding {
    dimension: usize,
}

impl HashingEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn bucket(&self, feature: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        feature.hash(&mut hasher);
        (hasher.finish() % self.dimension as u64) as usize
    }

    fn hash_text(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.dimension];

        let lowered = text.to_lowercase();
        for word in lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            vector[self.bucket(word)] += WORD_WEIGHT;

            let marked: Vec<char> = std::iter::once('^')
                .chain(word.chars())
                .chain(std::iter::once('$'))
                .collect();
            for trigram in marked.windows(3) {
                let trigram: String = trigram.iter().collect();
                vector[self.bucket(&trigram)] += TRIGRAM_WEIGHT;
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }

        Embedding::new(vector)
    }
}

#[async_trait]
impl EmbeddingBackend for HashingEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        Ok(self.hash_text(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.hash_text(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_protocols::embedding::cosine_similarity;

    #[tokio::test]
    async fn test_dimension_and_norm() {
        let backend = HashingEmbedding::new(64);
        let embedding = backend.embed("User lives in San Francisco").await.unwrap();

        assert_eq!(embedding.dimension, 64);
        let norm: f32 = embedding.vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert!(embedding.vector.iter().all(|x| *x >= 0.0));
    }

    #[tokio::test]
    async fn test_deterministic() {
        let backend = HashingEmbedding::new(128);
        let a = backend.embed("same text").await.unwrap();
        let b = backend.embed("same text").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_case_insensitive() {
        let backend = HashingEmbedding::new(128);
        let a = backend.embed("San Francisco").await.unwrap();
        let b = backend.embed("san francisco").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_shared_words_are_closer() {
        let backend = HashingEmbedding::new(256);
        let fact = backend.embed("User lives in San Francisco").await.unwrap();
        let related = backend.embed("where does the user live").await.unwrap();
        let unrelated = backend.embed("favourite colour is green").await.unwrap();

        let near = cosine_similarity(&fact.vector, &related.vector);
        let far = cosine_similarity(&fact.vector, &unrelated.vector);
        assert!(near > far, "near={near} far={far}");
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let backend = HashingEmbedding::new(16);
        let embedding = backend.embed("").await.unwrap();
        assert!(embedding.vector.iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn test_batch_matches_single() {
        let backend = HashingEmbedding::new(32);
        let batch = backend.embed_batch(&["a b", "c d"]).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1], backend.embed("c d").await.unwrap());
    }

    #[test]
    fn test_zero_dimension_clamped() {
        assert_eq!(HashingEmbedding::new(0).dimension(), 1);
    }
}
