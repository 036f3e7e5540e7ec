use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub ordinal: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub source_id: String,
    pub ordinal: u32,
    pub text: String,
    pub embedding: Vec<f32>,
}

impl IndexEntry {
    pub fn new(
        source_id: impl Into<String>,
        ordinal: u32,
        text: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        let source_id = source_id.into();
        let id = derive_entry_id(&source_id, ordinal);
        Self {
            id,
            source_id,
            ordinal,
            text: text.into(),
            embedding,
        }
    }
}

pub fn derive_entry_id(source_id: &str, ordinal: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_id.as_bytes());
    hasher.update(ordinal.to_le_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes).to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedMatch {
    pub text: String,
    pub score: f32,
    pub source_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub question: String,
    pub matches: Vec<RetrievedMatch>,
    pub answer: Option<String>,
}

impl QueryResult {
    pub fn is_no_match(&self) -> bool {
        self.matches.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::Cosine => formatter.write_str("cosine"),
            DistanceMetric::Euclidean => formatter.write_str("euclidean"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionHandle {
    pub name: String,
    pub dimension: usize,
    pub metric: DistanceMetric,
}
