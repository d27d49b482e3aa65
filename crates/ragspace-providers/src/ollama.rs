//! Ollama provider.
//!
//! Local LLM runtime. Streaming chat via `/api/chat` (newline-delimited
//! JSON) and embeddings via `/api/embeddings`.
//! Ollama API: <https://github.com/ollama/ollama/blob/main/docs/api.md>

use async_trait::async_trait;
use futures::StreamExt;
use ragspace_core::{
    AiProvider, ChatMessage, MessageRole, ModelInfo, ModelParameters, ProviderError, TokenStream,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default model for embeddings.
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Ollama provider.
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaProvider {
    /// Create a provider reading `OLLAMA_BASE_URL` from the environment,
    /// defaulting to `http://localhost:11434`.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(base_url)
    }

    /// Create a provider with an explicit base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn convert_messages(messages: &[ChatMessage]) -> Vec<OllamaMessage> {
        messages
            .iter()
            .map(|m| OllamaMessage {
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

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl AiProvider for OllamaProvider {
    fn id(&self) -> &str {
        "ollama"
    }

    fn name(&self) -> &str {
        "Ollama"
    }

    fn models(&self) -> Vec<ModelInfo> {
        ["llama3", "mistral"]
            .into_iter()
            .map(|id| ModelInfo {
                id: id.to_string(),
                name: id.to_string(),
                provider_id: "ollama".to_string(),
            })
            .collect()
    }

    async fn is_available(&self) -> bool {
        // Local runtime, no credentials; an endpoint is always configured.
        !self.base_url.is_empty()
    }

    async fn stream(
        &self,
        messages: &[ChatMessage],
        model_id: &str,
        params: Option<&ModelParameters>,
    ) -> Result<TokenStream, ProviderError> {
        debug!("ollama stream: model={model_id}");

        let request = OllamaChatRequest {
            model: model_id.to_string(),
            messages: Self::convert_messages(messages),
            stream: true,
            options: params.map(|p| OllamaOptions {
                temperature: p.temperature,
                num_predict: p.max_tokens,
                top_p: p.top_p,
            }),
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
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

            while let Some(chunk) = bytes_stream.next().await {
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

                    if line.is_empty() {
                        continue;
                    }

                    match serde_json::from_str::<OllamaChatResponse>(&line) {
                        Ok(parsed) => {
                            if !parsed.message.content.is_empty() {
                                yield Ok(parsed.message.content);
                            }
                            if parsed.done {
                                return;
                            }
                        }
                        Err(e) => {
                            debug!("skipping unparseable ollama chunk: {e}");
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
        let model = model_id.unwrap_or(DEFAULT_EMBEDDING_MODEL);

        let request = OllamaEmbedRequest {
            model: model.to_string(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
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

        let parsed: OllamaEmbedResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(parsed.embedding)
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Serialize)]
struct OllamaEmbedRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embedding: Vec<f32>,
}
