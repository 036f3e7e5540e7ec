use crate::error::EmbedError;
use crate::traits::EmbeddingProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_HF_ENDPOINT: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_EMBED_MODEL: &str = "sentence-transformers/all-mpnet-base-v2";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct HuggingFaceEmbeddings {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl HuggingFaceEmbeddings {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
            client: Client::new(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl Default for HuggingFaceEmbeddings {
    fn default() -> Self {
        Self::new(DEFAULT_HF_ENDPOINT, DEFAULT_EMBED_MODEL)
    }
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceEmbeddings {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn fetch_embedding(&self, text: &str) -> Result<Value, EmbedError> {
        let mut request = self
            .client
            .post(format!(
                "{}/pipeline/feature-extraction/{}",
                self.endpoint, self.model
            ))
            .timeout(REQUEST_TIMEOUT)
            .json(&json!({ "inputs": text }));

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(EmbedError::Backend {
                provider: self.name().to_string(),
                status,
                details,
            });
        }

        Ok(response.json().await?)
    }
}
