use crate::error::IndexError;
use crate::models::{CollectionHandle, DistanceMetric, IndexEntry, RetrievedMatch};
use crate::traits::VectorStore;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};

pub struct QdrantStore {
    endpoint: String,
    client: Client,
    api_key: Option<String>,
    metric: DistanceMetric,
}

impl QdrantStore {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: Client::new(),
            api_key: None,
            metric: DistanceMetric::default(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(api_key) => request.header("api-key", api_key),
            None => request,
        }
    }

    async fn describe_collection(&self, name: &str) -> Result<Option<Value>, IndexError> {
        let response = self
            .authorize(
                self.client
                    .get(format!("{}/collections/{}", self.endpoint, name)),
            )
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(IndexError::BackendResponse {
                backend: "qdrant".to_string(),
                details: response.status().to_string(),
            });
        }

        Ok(Some(response.json().await?))
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    fn metric(&self) -> DistanceMetric {
        self.metric
    }

    async fn ensure_collection(
        &self,
        name: &str,
        dimension: usize,
    ) -> Result<CollectionHandle, IndexError> {
        let handle = CollectionHandle {
            name: name.to_string(),
            dimension,
            metric: self.metric,
        };

        if let Some(description) = self.describe_collection(name).await? {
            validate_description(name, dimension, self.metric, &description)?;
            return Ok(handle);
        }

        let created = self
            .authorize(
                self.client
                    .put(format!("{}/collections/{}", self.endpoint, name)),
            )
            .json(&json!({
                "vectors": {
                    "size": dimension,
                    "distance": qdrant_metric_name(self.metric),
                }
            }))
            .send()
            .await?;

        if created.status().is_success() {
            return Ok(handle);
        }

        let create_status = created.status();
        match self.describe_collection(name).await? {
            Some(description) => {
                validate_description(name, dimension, self.metric, &description)?;
                Ok(handle)
            }
            None => Err(IndexError::BackendResponse {
                backend: "qdrant".to_string(),
                details: create_status.to_string(),
            }),
        }
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

        let points = entries
            .iter()
            .map(|entry| {
                json!({
                    "id": entry.id,
                    "vector": entry.embedding,
                    "payload": {
                        "text": entry.text,
                        "source_id": entry.source_id,
                        "ordinal": entry.ordinal,
                    },
                })
            })
            .collect::<Vec<_>>();

        let response = self
            .authorize(self.client.put(format!(
                "{}/collections/{}/points?wait=true",
                self.endpoint, handle.name
            )))
            .json(&json!({ "points": points }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IndexError::BackendResponse {
                backend: "qdrant".to_string(),
                details: response.status().to_string(),
            });
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

        let response = self
            .authorize(self.client.post(format!(
                "{}/collections/{}/points/search",
                self.endpoint, handle.name
            )))
            .json(&json!({
                "vector": query,
                "limit": top_k,
                "with_payload": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IndexError::BackendResponse {
                backend: "qdrant".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        Ok(parse_matches(&parsed))
    }
}

fn qdrant_metric_name(metric: DistanceMetric) -> &'static str {
    match metric {
        DistanceMetric::Cosine => "Cosine",
        DistanceMetric::Euclidean => "Euclid",
    }
}

fn validate_description(
    collection: &str,
    dimension: usize,
    metric: DistanceMetric,
    description: &Value,
) -> Result<(), IndexError> {
    let size = description
        .pointer("/result/config/params/vectors/size")
        .and_then(Value::as_u64)
        .ok_or_else(|| IndexError::BackendResponse {
            backend: "qdrant".to_string(),
            details: format!("collection {collection} description lacks a vector size"),
        })?;

    if size as usize != dimension {
        return Err(IndexError::DimensionConflict {
            collection: collection.to_string(),
            existing: size as usize,
            requested: dimension,
        });
    }

    let distance = description
        .pointer("/result/config/params/vectors/distance")
        .and_then(Value::as_str)
        .ok_or_else(|| IndexError::BackendResponse {
            backend: "qdrant".to_string(),
            details: format!("collection {collection} description lacks a distance metric"),
        })?;

    if !distance.eq_ignore_ascii_case(qdrant_metric_name(metric)) {
        return Err(IndexError::MetricConflict {
            collection: collection.to_string(),
            existing: distance.to_string(),
            requested: metric,
        });
    }

    Ok(())
}

fn parse_matches(payload: &Value) -> Vec<RetrievedMatch> {
    let hits = payload
        .pointer("/result")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut matches = Vec::new();
    for hit in hits {
        let text = hit
            .pointer("/payload/text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let source_id = hit
            .pointer("/payload/source_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let score = hit.pointer("/score").and_then(Value::as_f64).unwrap_or(0.0) as f32;

        matches.push(RetrievedMatch {
            text,
            score,
            source_id,
        });
    }

    matches
}
