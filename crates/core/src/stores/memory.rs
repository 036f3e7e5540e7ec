use crate::error::IndexError;
use crate::models::{CollectionHandle, DistanceMetric, IndexEntry, RetrievedMatch};
use crate::traits::VectorStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

struct MemoryCollection {
    dimension: usize,
    entries: Vec<IndexEntry>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, MemoryCollection>>>,
    metric: DistanceMetric,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metric(metric: DistanceMetric) -> Self {
        Self {
            collections: Arc::default(),
            metric,
        }
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    fn metric(&self) -> DistanceMetric {
        self.metric
    }

    async fn ensure_collection(
        &self,
        name: &str,
        dimension: usize,
    ) -> Result<CollectionHandle, IndexError> {
        let mut collections = self.collections.write().await;

        match collections.get(name) {
            Some(existing) if existing.dimension != dimension => {
                return Err(IndexError::DimensionConflict {
                    collection: name.to_string(),
                    existing: existing.dimension,
                    requested: dimension,
                });
            }
            Some(_) => {}
            None => {
                collections.insert(
                    name.to_string(),
                    MemoryCollection {
                        dimension,
                        entries: Vec::new(),
                    },
                );
            }
        }

        Ok(CollectionHandle {
            name: name.to_string(),
            dimension,
            metric: self.metric,
        })
    }

    async fn insert(
        &self,
        handle: &CollectionHandle,
        entries: &[IndexEntry],
    ) -> Result<usize, IndexError> {
        for entry in entries {
            if entry.embedding.len() != handle.dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: handle.dimension,
                    actual: entry.embedding.len(),
                });
            }
        }

        if entries.is_empty() {
            return Ok(0);
        }

        let mut collections = self.collections.write().await;
        let collection =
            collections
                .get_mut(&handle.name)
                .ok_or_else(|| IndexError::BackendResponse {
                    backend: "memory".to_string(),
                    details: format!("collection {} does not exist", handle.name),
                })?;

        for entry in entries {
            match collection
                .entries
                .iter_mut()
                .find(|existing| existing.id == entry.id)
            {
                Some(existing) => *existing = entry.clone(),
                None => collection.entries.push(entry.clone()),
            }
        }

        Ok(entries.len())
    }

    async fn search(
        &self,
        handle: &CollectionHandle,
        query: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedMatch>, IndexError> {
        if query.len() != handle.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: handle.dimension,
                actual: query.len(),
            });
        }

        let collections = self.collections.read().await;
        let collection =
            collections
                .get(&handle.name)
                .ok_or_else(|| IndexError::BackendResponse {
                    backend: "memory".to_string(),
                    details: format!("collection {} does not exist", handle.name),
                })?;

        let mut scored: Vec<RetrievedMatch> = collection
            .entries
            .iter()
            .map(|entry| RetrievedMatch {
                text: entry.text.clone(),
                score: score(self.metric, query, &entry.embedding),
                source_id: entry.source_id.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);

        Ok(scored)
    }
}

fn score(metric: DistanceMetric, query: &[f32], candidate: &[f32]) -> f32 {
    match metric {
        DistanceMetric::Cosine => cosine_similarity(query, candidate),
        DistanceMetric::Euclidean => -euclidean_distance(query, candidate),
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
