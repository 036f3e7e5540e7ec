use crate::error::GenerationError;
use crate::traits::Generator;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.3-70b-versatile";

const MAX_TOKENS: u32 = 512;
const TEMPERATURE: f32 = 0.1;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct GroqGenerator {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl GroqGenerator {
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

impl Default for GroqGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_GROQ_ENDPOINT, DEFAULT_CHAT_MODEL)
    }
}

#[async_trait]
impl Generator for GroqGenerator {
    fn name(&self) -> &str {
        "groq"
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
        });

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .timeout(REQUEST_TIMEOUT)
            .json(&body);

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(GenerationError::Backend {
                provider: self.name().to_string(),
                status,
                details,
            });
        }

        let payload: Value = response.json().await?;
        extract_content(&payload).ok_or_else(|| GenerationError::EmptyResponse {
            provider: self.name().to_string(),
        })
    }
}

fn extract_content(payload: &Value) -> Option<String> {
    payload
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}
