//! OpenAI provider.
//!
//! Streaming chat via the chat completions SSE endpoint (`data:` lines,
//! `[DONE]` sentinel) and embeddings via `/embeddings`.

use async_trait::async_trait;
use futures::StreamExt;
use ragspace_core::{
    AiProvider, ChatMessage, MessageRole, ModelInfo, ModelParameters, ProviderError, TokenStream,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model for embeddings.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// OpenAI provider.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    /// Create a provider reading `OPENAI_API_KEY` from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        Self::new(api_key, DEFAULT_BASE_URL)
    }

    /// Create a provider with an explicit key and base URL.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    fn require_key(&self) -> Result<(), ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::Unavailable(
                "OpenAI API key not configured".to_string(),
            ));
        }
        Ok(())
    }

    fn convert_messages(messages: &[ChatMessage]) -> Vec<OpenAiMessage> {
        messages
            .iter()
            .map(|m| OpenAiMessage {
                role: match m.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                }
                .to_string(),
                content: m.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn id(&self) -> &str {
        "openai"
    }

    fn name(&self) -> &str {
        "OpenAI"
    }

    fn models(&self) -> Vec<ModelInfo> {
        ["gpt-4o", "gpt-4o-mini", "gpt-4-turbo"]
            .into_iter()
            .map(|id| ModelInfo {
                id: id.to_string(),
                name: id.to_string(),
                provider_id: "openai".to_string(),
            })
            .collect()
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn stream(
        &self,
        messages: &[ChatMessage],
        model_id: &str,
        params: Option<&ModelParameters>,
    ) -> Result<TokenStream, ProviderError> {
        self.require_key()?;
        debug!("openai stream: model={model_id}");

        let request = OpenAiChatRequest {
            model: model_id.to_string(),
            messages: Self::convert_messages(messages),
            stream: true,
            temperature: params.and_then(|p| p.temperature),
            max_tokens: params.and_then(|p| p.max_tokens),
            top_p: params.and_then(|p| p.top_p),
            frequency_penalty: params.and_then(|p| p.frequency_penalty),
            presence_penalty: params.and_then(|p| p.presence_penalty),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let stream = async_stream::stream! {
            let mut bytes_stream = response.bytes_stream();
            let mut buffer = String::new();

            'outer: while let Some(chunk) = bytes_stream.next().await {
                let chunk = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(ProviderError::Stream(e.to_string()));
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(newline) = buffer.find('\n') {
                    let line = buffer[..newline].trim().to_string();
                    buffer.drain(..=newline);

                    let payload = match line.strip_prefix("data:") {
                        Some(rest) => rest.trim(),
                        None => continue,
                    };
                    if payload == "[DONE]" {
                        break 'outer;
                    }

                    match serde_json::from_str::<OpenAiChatChunk>(payload) {
                        Ok(parsed) => {
                            if let Some(text) = parsed.first_delta() {
                                if !text.is_empty() {
                                    yield Ok(text);
                                }
                            }
                        }
                        Err(e) => {
                            debug!("skipping unparseable openai chunk: {e}");
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    async fn embed_text(
        &self,
        text: &str,
        model_id: Option<&str>,
    ) -> Result<Vec<f32>, ProviderError> {
        self.require_key()?;
        let model = model_id.unwrap_or(DEFAULT_EMBEDDING_MODEL);

        let request = OpenAiEmbedRequest {
            model: model.to_string(),
            input: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let mut parsed: OpenAiEmbedResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        parsed
            .data
            .pop()
            .map(|d| d.embedding)
            .ok_or_else(|| ProviderError::Parse("empty embedding response".to_string()))
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatChunk {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

impl OpenAiChatChunk {
    fn first_delta(&self) -> Option<String> {
        self.choices.first()?.delta.content.clone()
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    delta: OpenAiDelta,
}

#[derive(Debug, Deserialize)]
struct OpenAiDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct OpenAiEmbedRequest {
    model: String,
    input: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
}
