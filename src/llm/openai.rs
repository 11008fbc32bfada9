use super::{GenerateRequest, GenerateResponse, LlmError, StreamChunk};
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Also used for Ollama, which exposes the same chat-completions wire.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiStreamResponse {
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiDelta {
    content: Option<String>,
}

fn build_messages(request: &GenerateRequest) -> Vec<OpenAiMessage> {
    let mut messages = Vec::new();
    if !request.system_instruction.is_empty() {
        messages.push(OpenAiMessage {
            role: "system".to_string(),
            content: request.system_instruction.clone(),
        });
    }
    for m in &request.history {
        // The neutral history speaks "model"; this wire calls it "assistant".
        let role = if m.role == "model" {
            "assistant"
        } else {
            m.role.as_str()
        };
        messages.push(OpenAiMessage {
            role: role.to_string(),
            content: m.text.clone(),
        });
    }
    messages.push(OpenAiMessage {
        role: "user".to_string(),
        content: request.message.clone(),
    });
    messages
}

pub async fn generate(
    config: &OpenAiConfig,
    request: &GenerateRequest,
) -> Result<GenerateResponse, LlmError> {
    let client = Client::new();
    let body = OpenAiRequest {
        model: request.model.clone(),
        messages: build_messages(request),
        stream: false,
    };

    let mut req = client
        .post(format!("{}/chat/completions", config.base_url))
        .header("Content-Type", "application/json")
        .json(&body);

    if !config.api_key.is_empty() {
        req = req.header("Authorization", format!("Bearer {}", config.api_key));
    }

    let resp = req.send().await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        return Err(LlmError::Api {
            status,
            message: text,
        });
    }

    let data: OpenAiResponse = resp.json().await?;
    let text = data
        .choices
        .first()
        .map(|c| c.message.content.clone())
        .unwrap_or_default();

    Ok(GenerateResponse {
        text,
        model: request.model.clone(),
    })
}

pub async fn generate_stream(
    config: &OpenAiConfig,
    request: &GenerateRequest,
    on_chunk: impl Fn(StreamChunk) + Send,
) -> Result<String, LlmError> {
    let client = Client::new();
    let body = OpenAiRequest {
        model: request.model.clone(),
        messages: build_messages(request),
        stream: true,
    };

    let mut req = client
        .post(format!("{}/chat/completions", config.base_url))
        .header("Content-Type", "application/json")
        .json(&body);

    if !config.api_key.is_empty() {
        req = req.header("Authorization", format!("Bearer {}", config.api_key));
    }

    let resp = req.send().await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        return Err(LlmError::Api {
            status,
            message: text,
        });
    }

    let mut full_text = String::new();
    let mut stream = resp.bytes_stream();
    let mut buffer = String::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(pos) = buffer.find('\n') {
            let line = buffer[..pos].trim().to_string();
            buffer = buffer[pos + 1..].to_string();

            if let Some(data) = line.strip_prefix("data: ") {
                if data == "[DONE]" {
                    on_chunk(StreamChunk {
                        delta: String::new(),
                        done: true,
                    });
                    return Ok(full_text);
                }

                if let Ok(parsed) = serde_json::from_str::<OpenAiStreamResponse>(data) {
                    if let Some(choice) = parsed.choices.first() {
                        if let Some(content) = &choice.delta.content {
                            full_text.push_str(content);
                            on_chunk(StreamChunk {
                                delta: content.clone(),
                                done: false,
                            });
                        }
                        if choice.finish_reason.is_some() {
                            on_chunk(StreamChunk {
                                delta: String::new(),
                                done: true,
                            });
                            return Ok(full_text);
                        }
                    }
                }
            }
        }
    }

    on_chunk(StreamChunk {
        delta: String::new(),
        done: true,
    });
    Ok(full_text)
}
