use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::{ReasoningError, ReasoningService};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/responses";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1-mini";

const SYSTEM_PROMPT: &str = "You are a friendly local guide. Follow the formatting instructions in the user message exactly.";

#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(
        http: Client,
        endpoint: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ReasoningError> {
        Ok(Self {
            http,
            endpoint: Url::parse(endpoint)?,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ReasoningService for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, ReasoningError> {
        let payload = serde_json::json!({
            "model": self.model,
            "input": [
                {
                    "role": "system",
                    "content": [
                        { "type": "input_text", "text": SYSTEM_PROMPT }
                    ]
                },
                {
                    "role": "user",
                    "content": [
                        { "type": "input_text", "text": prompt }
                    ]
                }
            ]
        });

        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.as_str())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        debug!(model = %self.model, status = status.as_u16(), prompt_chars = prompt.len(), "openai responded");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReasoningError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response.json().await?;
        extract_output_text(&body)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ReasoningError::EmptyOutput)
    }
}

pub(crate) fn extract_output_text(payload: &serde_json::Value) -> Option<String> {
    if let Some(value) = payload.get("output_text").and_then(|value| value.as_str()) {
        return Some(value.to_string());
    }
    let output = payload.get("output")?.as_array()?;
    let mut chunks = Vec::new();
    for item in output {
        if let Some(content) = item.get("content").and_then(|value| value.as_array()) {
            for content_item in content {
                if content_item.get("type").and_then(|value| value.as_str()) == Some("output_text")
                {
                    if let Some(text) = content_item.get("text").and_then(|value| value.as_str()) {
                        chunks.push(text.to_string());
                    }
                }
            }
        }
    }
    if chunks.is_empty() {
        None
    } else {
        Some(chunks.join("\n\n"))
    }
}
