use super::{GenerateRequest, GenerateResponse, LlmError, StreamChunk};
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

fn build_request(request: &GenerateRequest) -> GeminiRequest {
    // History roles pass through: the wire already speaks "user"/"model".
    let mut contents: Vec<GeminiContent> = request
        .history
        .iter()
        .map(|m| GeminiContent {
            role: Some(m.role.clone()),
            parts: vec![GeminiPart {
                text: m.text.clone(),
            }],
        })
        .collect();
    contents.push(GeminiContent {
        role: Some("user".to_string()),
        parts: vec![GeminiPart {
            text: request.message.clone(),
        }],
    });

    let system_instruction = if request.system_instruction.is_empty() {
        None
    } else {
        Some(GeminiContent {
            role: None,
            parts: vec![GeminiPart {
                text: request.system_instruction.clone(),
            }],
        })
    };

    GeminiRequest {
        system_instruction,
        contents,
    }
}

fn candidate_text(data: &GeminiResponse) -> String {
    data.candidates
        .first()
        .map(|c| {
            c.content
                .parts
                .iter()
                .map(|p| p.text.as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

pub async fn generate(
    config: &GeminiConfig,
    request: &GenerateRequest,
) -> Result<GenerateResponse, LlmError> {
    let client = Client::new();
    let body = build_request(request);

    let resp = client
        .post(format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url, request.model
        ))
        .header("Content-Type", "application/json")
        .header("x-goog-api-key", &config.api_key)
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        return Err(LlmError::Api {
            status,
            message: text,
        });
    }

    let data: GeminiResponse = resp.json().await?;
    Ok(GenerateResponse {
        text: candidate_text(&data),
        model: request.model.clone(),
    })
}

pub async fn generate_stream(
    config: &GeminiConfig,
    request: &GenerateRequest,
    on_chunk: impl Fn(StreamChunk) + Send,
) -> Result<String, LlmError> {
    let client = Client::new();
    let body = build_request(request);

    let resp = client
        .post(format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            config.base_url, request.model
        ))
        .header("Content-Type", "application/json")
        .header("x-goog-api-key", &config.api_key)
        .json(&body)
        .send()
        .await?;

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
                if let Ok(parsed) = serde_json::from_str::<GeminiResponse>(data) {
                    let delta = candidate_text(&parsed);
                    if !delta.is_empty() {
                        full_text.push_str(&delta);
                        on_chunk(StreamChunk {
                            delta,
                            done: false,
                        });
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
