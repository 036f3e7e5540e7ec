use crate::embedder::DEFAULT_EMBEDDING_DIMENSIONS;
use crate::error::EmbedError;
use crate::traits::EmbeddingProvider;
use async_trait::async_trait;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy)]
pub struct NgramProvider {
    dimensions: usize,
}

impl NgramProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return vector;
        }

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

impl Default for NgramProvider {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIMENSIONS)
    }
}

#[async_trait]
impl EmbeddingProvider for NgramProvider {
    fn name(&self) -> &str {
        "ngram"
    }

    async fn fetch_embedding(&self, text: &str) -> Result<Value, EmbedError> {
        Ok(json!(self.vectorize(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_default_provider_uses_the_standard_dimensions() {
        assert_eq!(
            NgramProvider::default().dimensions(),
            DEFAULT_EMBEDDING_DIMENSIONS
        );
    }

    #[test]
    fn vectors_are_deterministic() {
        let provider = NgramProvider::new(64);
        let first = provider.vectorize("Hydraulic pressure and flow");
        let second = provider.vectorize("Hydraulic pressure and flow");
        assert_eq!(first, second);
    }

    #[test]
    fn vectors_match_the_configured_dimensions() {
        let provider = NgramProvider::new(32);
        assert_eq!(provider.vectorize("abc").len(), 32);
    }

    #[test]
    fn nonempty_text_yields_a_unit_vector() {
        let provider = NgramProvider::new(32);
        let vector = provider.vectorize("the quick brown fox");
        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_yields_a_zero_vector() {
        let provider = NgramProvider::new(16);
        let vector = provider.vectorize("");
        assert!(vector.iter().all(|value| *value == 0.0));
    }
}
