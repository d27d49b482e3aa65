//! # ragspace-providers
//!
//! AI provider implementations for ragspace.
//!
//! Each provider implements [`AiProvider`](ragspace_core::AiProvider):
//! streaming chat completion as a [`TokenStream`](ragspace_core::TokenStream)
//! plus text embeddings.
//!
//! | Provider | Chat transport | Embeddings |
//! |----------|----------------|------------|
//! | [`GeminiProvider`] | `streamGenerateContent` (NDJSON array) | `embedContent` |
//! | [`OpenAiProvider`] | chat completions SSE | `/embeddings` |
//! | [`OllamaProvider`] | `/api/chat` (NDJSON) | `/api/embeddings` |
//!
//! [`ProviderRegistry`] holds the configured set; it is built once at
//! startup and injected wherever providers are needed. Availability
//! (API key present) is reported by `is_available` and checked by callers;
//! lookup itself never fails on an unconfigured provider.

pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod registry;

pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use registry::{ProviderRegistry, DEFAULT_CHAT_PROVIDER, DEFAULT_EMBEDDING_PROVIDER};
