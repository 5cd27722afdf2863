mod gemini;
mod openai;

use thiserror::Error;

pub use gemini::{GeminiClient, DEFAULT_GEMINI_MODEL, DEFAULT_GEMINI_URL};
pub use openai::{OpenAiClient, DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_URL};

#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("reasoning request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("reasoning service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("reasoning response had no text output")]
    EmptyOutput,
    #[error("invalid endpoint url: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("reasoning service is disabled")]
    Disabled,
}

/// Text-in, text-out completion. Implementations must not retry internally;
/// callers own the fallback policy.
pub trait ReasoningService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ReasoningError>;
}

#[derive(Clone)]
pub enum Reasoner {
    Gemini(GeminiClient),
    OpenAi(OpenAiClient),
    Disabled,
}

impl Reasoner {
    pub fn backend(&self) -> &'static str {
        match self {
            Reasoner::Gemini(_) => "gemini",
            Reasoner::OpenAi(_) => "openai_responses",
            Reasoner::Disabled => "local_only",
        }
    }

    pub fn model(&self) -> Option<&str> {
        match self {
            Reasoner::Gemini(client) => Some(client.model()),
            Reasoner::OpenAi(client) => Some(client.model()),
            Reasoner::Disabled => None,
        }
    }
}

impl ReasoningService for Reasoner {
    async fn complete(&self, prompt: &str) -> Result<String, ReasoningError> {
        match self {
            Reasoner::Gemini(client) => client.complete(prompt).await,
            Reasoner::OpenAi(client) => client.complete(prompt).await,
            Reasoner::Disabled => Err(ReasoningError::Disabled),
        }
    }
}
