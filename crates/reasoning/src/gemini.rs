use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::{ReasoningError, ReasoningService};

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-001";

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    base: Url,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(
        http: Client,
        base: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ReasoningError> {
        Ok(Self {
            http,
            base: Url::parse(base.trim_end_matches('/'))?,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base.as_str().trim_end_matches('/'),
            self.model
        )
    }
}

impl ReasoningService for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, ReasoningError> {
        let payload = serde_json::json!({
            "contents": [
                { "role": "user", "parts": [ { "text": prompt } ] }
            ]
        });

        let response = self
            .http
            .post(self.generate_url())
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        debug!(model = %self.model, status = status.as_u16(), prompt_chars = prompt.len(), "gemini responded");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReasoningError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response.json().await?;
        extract_candidate_text(&body)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ReasoningError::EmptyOutput)
    }
}

/// Concatenates the text parts of the first candidate.
pub(crate) fn extract_candidate_text(payload: &serde_json::Value) -> Option<String> {
    let parts = payload
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|value| value.as_str()))
        .collect::<Vec<_>>()
        .join("");

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_first_candidate_parts() {
        let payload = json!({
            "candidates": [
                { "content": { "role": "model", "parts": [ { "text": "pick these: " }, { "text": "[2, 5, 9]" } ] } },
                { "content": { "parts": [ { "text": "ignored" } ] } }
            ]
        });
        assert_eq!(
            extract_candidate_text(&payload).as_deref(),
            Some("pick these: [2, 5, 9]")
        );
    }

    #[test]
    fn blocked_prompt_has_no_text() {
        let payload = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert_eq!(extract_candidate_text(&payload), None);
    }

    #[test]
    fn builds_model_url() {
        let client = GeminiClient::new(
            Client::new(),
            "https://generativelanguage.googleapis.com/v1beta/",
            "key",
            "gemini-2.0-flash-001",
        )
        .unwrap();
        assert_eq!(
            client.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-001:generateContent"
        );
    }
}
