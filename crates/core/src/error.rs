use crate::models::DistanceMetric;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("{provider} returned {status}: {details}")]
    Backend {
        provider: String,
        status: StatusCode,
        details: String,
    },

    #[error("{provider} embedding unavailable after {attempts} attempts: {details}")]
    ProviderUnavailable {
        provider: String,
        attempts: u32,
        details: String,
    },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("{provider} embedding payload is not a flat numeric sequence: {details}")]
    MalformedPayload { provider: String, details: String },
}

impl EmbedError {
    pub(crate) fn is_transient(&self) -> bool {
        matches!(self, EmbedError::Http(_) | EmbedError::Backend { .. })
    }
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("collection {collection} already exists with dimension {existing}, requested {requested}")]
    DimensionConflict {
        collection: String,
        existing: usize,
        requested: usize,
    },

    #[error("collection {collection} already exists with {existing} distance, requested {requested}")]
    MetricConflict {
        collection: String,
        existing: String,
        requested: DistanceMetric,
    },

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("{provider} returned {status}: {details}")]
    Backend {
        provider: String,
        status: StatusCode,
        details: String,
    },

    #[error("{provider} completion contained no answer text")]
    EmptyResponse { provider: String },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("embedding error: {0}")]
    Embed(#[from] EmbedError),

    #[error("vector index error: {0}")]
    Index(#[from] IndexError),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("embedding error: {0}")]
    Embed(#[from] EmbedError),

    #[error("vector index error: {0}")]
    Index(#[from] IndexError),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
