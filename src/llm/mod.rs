pub mod gemini;
pub mod openai;

use serde::{Deserialize, Serialize};

/// One history entry on the wire: role is "user" or "model".
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub system_instruction: String,
    pub history: Vec<ChatMessage>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerateResponse {
    pub text: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    pub delta: String,
    pub done: bool,
}

/// Unified backend enum dispatching to Gemini or OpenAI-compatible endpoints.
#[derive(Debug, Clone)]
pub enum Provider {
    Gemini(gemini::GeminiConfig),
    OpenAi(openai::OpenAiConfig),
    Ollama(openai::OpenAiConfig),
}

impl Provider {
    pub fn gemini(api_key: String) -> Self {
        Provider::Gemini(gemini::GeminiConfig {
            api_key,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        })
    }

    pub fn openai(api_key: String) -> Self {
        Provider::OpenAi(openai::OpenAiConfig {
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
        })
    }

    pub fn ollama(host: String) -> Self {
        Provider::Ollama(openai::OpenAiConfig {
            api_key: String::new(),
            base_url: format!("{}/v1", host),
        })
    }

    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, LlmError> {
        match self {
            Provider::Gemini(config) => gemini::generate(config, request).await,
            Provider::OpenAi(config) | Provider::Ollama(config) => {
                openai::generate(config, request).await
            }
        }
    }

    pub async fn generate_stream(
        &self,
        request: &GenerateRequest,
        on_chunk: impl Fn(StreamChunk) + Send,
    ) -> Result<String, LlmError> {
        match self {
            Provider::Gemini(config) => gemini::generate_stream(config, request, on_chunk).await,
            Provider::OpenAi(config) | Provider::Ollama(config) => {
                openai::generate_stream(config, request, on_chunk).await
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
}
