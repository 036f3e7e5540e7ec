use crate::error::EmbedError;
use crate::traits::EmbeddingProvider;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 768;

#[derive(Debug, Clone, Copy)]
pub struct EmbedOptions {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub throttle: Duration,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base: Duration::from_millis(500),
            throttle: Duration::from_millis(200),
        }
    }
}

pub struct EmbeddingClient<P>
where
    P: EmbeddingProvider,
{
    provider: P,
    dimension: usize,
    options: EmbedOptions,
}

impl<P> EmbeddingClient<P>
where
    P: EmbeddingProvider + Send + Sync,
{
    pub fn new(provider: P, dimension: usize) -> Self {
        Self::with_options(provider, dimension, EmbedOptions::default())
    }

    pub fn with_options(provider: P, dimension: usize, options: EmbedOptions) -> Self {
        Self {
            provider,
            dimension,
            options,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut last_failure = None;

        for attempt in 1..=self.options.max_attempts {
            debug!(
                provider = self.provider.name(),
                attempt, "requesting embedding"
            );

            match self.provider.fetch_embedding(text).await {
                Ok(raw) => return self.validate(&raw),
                Err(error) if error.is_transient() => {
                    warn!(
                        provider = self.provider.name(),
                        attempt,
                        error = %error,
                        "embedding attempt failed"
                    );
                    last_failure = Some(error);
                    if attempt < self.options.max_attempts {
                        tokio::time::sleep(backoff_delay(attempt, self.options.backoff_base)).await;
                    }
                }
                Err(error) => return Err(error),
            }
        }

        let details = last_failure
            .map(|error| error.to_string())
            .unwrap_or_else(|| "no attempts were made".to_string());
        Err(EmbedError::ProviderUnavailable {
            provider: self.provider.name().to_string(),
            attempts: self.options.max_attempts,
            details,
        })
    }

    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let mut vectors = Vec::with_capacity(texts.len());

        for (position, text) in texts.iter().enumerate() {
            vectors.push(self.embed(text).await?);
            if position + 1 < texts.len() {
                tokio::time::sleep(self.options.throttle).await;
            }
        }

        Ok(vectors)
    }

    fn validate(&self, raw: &Value) -> Result<Vec<f32>, EmbedError> {
        let values = flatten_embedding(raw).ok_or_else(|| EmbedError::MalformedPayload {
            provider: self.provider.name().to_string(),
            details: describe_payload(raw),
        })?;

        if values.len() != self.dimension {
            return Err(EmbedError::DimensionMismatch {
                expected: self.dimension,
                actual: values.len(),
            });
        }

        Ok(values)
    }
}

pub(crate) fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    base * attempt
}

fn flatten_embedding(raw: &Value) -> Option<Vec<f32>> {
    let outer = raw.as_array()?;
    let values = match outer.first() {
        Some(Value::Array(inner)) => inner,
        _ => outer,
    };

    values
        .iter()
        .map(|value| value.as_f64().map(|number| number as f32))
        .collect()
}

fn describe_payload(raw: &Value) -> String {
    match raw {
        Value::Array(_) => "array holds non-numeric or deeply nested values".to_string(),
        Value::Null => "expected an array, got null".to_string(),
        Value::Bool(_) => "expected an array, got a boolean".to_string(),
        Value::Number(_) => "expected an array, got a bare number".to_string(),
        Value::String(_) => "expected an array, got a string".to_string(),
        Value::Object(_) => "expected an array, got an object".to_string(),
    }
}
