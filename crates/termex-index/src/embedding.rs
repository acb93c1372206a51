use crate::analyze::analyze;
use async_trait::async_trait;
use std::collections::HashMap;
use termex_core::{TermexError, TermexResult};

/// Trait for computing fixed-dimension text embeddings.
///
/// Implementations backed by an external model report failures as
/// [`TermexError::Dependency`].
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Compute the embedding vector for a single text.
    async fn embed(&self, text: &str) -> TermexResult<Vec<f32>>;

    /// Compute embeddings for a batch of texts, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> TermexResult<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Dimension of the vectors produced by this provider.
    fn dimension(&self) -> usize;
}

/// Local hashed bag-of-features embedding.
///
/// Features come from [`analyze`], so Japanese terms contribute their
/// character bigrams and terms sharing bigrams land close together. The
/// output is deterministic and L2-normalized.
pub struct LocalEmbedding {
    dimension: usize,
}

impl LocalEmbedding {
    /// Create an embedder producing vectors of `dimension` components.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

impl Default for LocalEmbedding {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedding {
    async fn embed(&self, text: &str) -> TermexResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(TermexError::Input("cannot embed empty text".to_string()));
        }

        let mut vector = vec![0.0f32; self.dimension];

        let features = analyze(text);
        if features.is_empty() {
            return Ok(vector);
        }

        let mut freq: HashMap<&str, f32> = HashMap::new();
        for feature in &features {
            *freq.entry(feature.as_str()).or_insert(0.0) += 1.0;
        }

        let total = features.len() as f32;
        for (feature, count) in &freq {
            let tf = count / total;
            let bytes = feature.as_bytes();
            let hash1 = fnv1a(bytes) as usize;
            let hash2 = fnv1a(&[bytes, &[1u8]].concat()) as usize;
            let hash3 = fnv1a(&[bytes, &[2u8]].concat()) as usize;

            vector[hash1 % self.dimension] += tf;
            vector[hash2 % self.dimension] += tf * 0.7;
            vector[hash3 % self.dimension] += tf * 0.5;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn fnv1a(data: &[u8]) -> u32 {
    let mut hash: u32 = 2_166_136_261;
    for &byte in data {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(16_777_619);
    }
    hash
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
    }

    #[tokio::test]
    async fn test_dimension() {
        let emb = LocalEmbedding::new(64);
        assert_eq!(emb.dimension(), 64);
        assert_eq!(emb.embed("鉄筋コンクリート").await.unwrap().len(), 64);
    }

    #[tokio::test]
    async fn test_normalized() {
        let emb = LocalEmbedding::default();
        let v = emb.embed("施工管理").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let emb = LocalEmbedding::default();
        let a = emb.embed("空調設備").await.unwrap();
        let b = emb.embed("空調設備").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_shared_bigrams_are_closer() {
        let emb = LocalEmbedding::default();
        let query = emb.embed("コンクリート").await.unwrap();
        let near = emb.embed("鉄筋コンクリート").await.unwrap();
        let far = emb.embed("給排水設備").await.unwrap();
        assert!(squared_distance(&query, &near) < squared_distance(&query, &far));
    }

    #[tokio::test]
    async fn test_empty_text_is_input_error() {
        let emb = LocalEmbedding::default();
        assert!(emb.embed("").await.unwrap_err().is_input());
        assert!(emb.embed("   ").await.unwrap_err().is_input());
    }

    #[tokio::test]
    async fn test_punctuation_only_gives_zero_vector() {
        let emb = LocalEmbedding::new(8);
        assert_eq!(emb.embed("・・").await.unwrap(), vec![0.0; 8]);
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let emb = LocalEmbedding::default();
        let batch = emb.embed_batch(&["基礎工事", "RC"]).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], emb.embed("基礎工事").await.unwrap());
        assert_eq!(batch[1], emb.embed("RC").await.unwrap());
    }
}
