use crate::error::{EmbedError, GenerationError, IndexError};
use crate::models::{CollectionHandle, DistanceMetric, IndexEntry, RetrievedMatch};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait EmbeddingProvider {
    fn name(&self) -> &str;

    async fn fetch_embedding(&self, text: &str) -> Result<Value, EmbedError>;
}

#[async_trait]
pub trait VectorStore {
    fn metric(&self) -> DistanceMetric;

    async fn ensure_collection(
        &self,
        name: &str,
        dimension: usize,
    ) -> Result<CollectionHandle, IndexError>;

    async fn insert(
        &self,
        handle: &CollectionHandle,
        entries: &[IndexEntry],
    ) -> Result<usize, IndexError>;

    async fn search(
        &self,
        handle: &CollectionHandle,
        query: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedMatch>, IndexError>;
}

#[async_trait]
pub trait Generator {
    fn name(&self) -> &str;

    async fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError>;
}
