//! Google Gemini provider.
//!
//! Streaming chat via `streamGenerateContent` (newline-delimited JSON
//! objects inside a top-level array) and embeddings via `embedContent`.

use async_trait::async_trait;
use futures::StreamExt;
use ragspace_core::{
    AiProvider, ChatMessage, MessageRole, ModelInfo, ModelParameters, ProviderError, TokenStream,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model for embeddings.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

/// Google Gemini provider.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    /// Create a provider reading `GOOGLE_AI_API_KEY` (or `GEMINI_API_KEY`)
    /// from the environment. An absent key leaves the provider registered
    /// but unavailable.
    #[must_use]
    pub fn from_env() -> Self {
        let api_key = std::env::var("GOOGLE_AI_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .unwrap_or_default();
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
                "Gemini API key not configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Split our message list into Gemini's system instruction plus contents.
    /// Gemini uses `model` for the assistant role.
    fn convert_messages(messages: &[ChatMessage]) -> (Option<String>, Vec<GeminiContent>) {
        let mut system_instruction = None;
        let mut contents = Vec::new();

        for msg in messages {
            match msg.role {
                MessageRole::System => system_instruction = Some(msg.content.clone()),
                MessageRole::User | MessageRole::Assistant => contents.push(GeminiContent {
                    role: if msg.role == MessageRole::Assistant {
                        "model".to_string()
                    } else {
                        "user".to_string()
                    },
                    parts: vec![GeminiPart {
                        text: msg.content.clone(),
                    }],
                }),
            }
        }

        (system_instruction, contents)
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    fn id(&self) -> &str {
        "gemini"
    }

    fn name(&self) -> &str {
        "Google Gemini"
    }

    fn models(&self) -> Vec<ModelInfo> {
        ["gemini-pro", "gemini-1.5-pro", "gemini-1.5-flash"]
            .into_iter()
            .map(|id| ModelInfo {
                id: id.to_string(),
                name: id.to_string(),
                provider_id: "gemini".to_string(),
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
        debug!("gemini stream: model={model_id}");

        let (system_instruction, contents) = Self::convert_messages(messages);
        let request = GeminiRequest {
            contents,
            system_instruction: system_instruction
                .map(|text| GeminiSystemInstruction {
                    parts: vec![GeminiPart { text }],
                }),
            generation_config: params.map(|p| GeminiGenerationConfig {
                temperature: p.temperature,
                max_output_tokens: p.max_tokens,
                top_p: p.top_p,
            }),
        };

        let url = format!(
            "{}/models/{}:streamGenerateContent?key={}",
            self.base_url, model_id, self.api_key
        );

        let response = self
            .client
            .post(&url)
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

                // The endpoint emits a JSON array of response objects, one
                // per line, with `[`/`]`/`,` framing between them.
                while let Some(newline) = buffer.find('\n') {
                    let line = buffer[..newline].trim().to_string();
                    buffer.drain(..=newline);

                    if line.is_empty() || line == "[" || line == "]" || line == "," {
                        continue;
                    }
                    let line = line.trim_start_matches(',').trim_end_matches(',');

                    match serde_json::from_str::<GeminiResponse>(line) {
                        Ok(parsed) => {
                            if let Some(text) = parsed.first_text() {
                                if !text.is_empty() {
                                    yield Ok(text);
                                }
                            }
                        }
                        Err(e) => {
                            debug!("skipping unparseable gemini chunk: {e}");
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

        let url = format!(
            "{}/models/{}:embedContent?key={}",
            self.base_url, model, self.api_key
        );
        let request = GeminiEmbedRequest {
            model: format!("models/{model}"),
            content: GeminiContentBody {
                parts: vec![GeminiPart {
                    text: text.to_string(),
                }],
            },
        };

        let response = self
            .client
            .post(&url)
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

        let parsed: GeminiEmbedResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(parsed.embedding.values)
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(rename = "topP", skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

impl GeminiResponse {
    fn first_text(&self) -> Option<String> {
        self.candidates
            .first()?
            .content
            .parts
            .first()
            .map(|p| p.text.clone())
    }
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiEmbedRequest {
    model: String,
    content: GeminiContentBody,
}

#[derive(Debug, Serialize)]
struct GeminiContentBody {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiEmbedResponse {
    embedding: GeminiEmbedding,
}

#[derive(Debug, Deserialize)]
struct GeminiEmbedding {
    values: Vec<f32>,
}
