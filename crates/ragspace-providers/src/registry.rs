//! Provider registry.

use ragspace_core::AiProvider;
use std::collections::HashMap;
use std::sync::Arc;

/// Default provider id for chat when nothing else is configured.
pub const DEFAULT_CHAT_PROVIDER: &str = "gemini";

/// Default provider id for embeddings.
///
/// Ingestion and retrieval both embed through this provider so stored and
/// query vectors stay in the same space.
pub const DEFAULT_EMBEDDING_PROVIDER: &str = "gemini";

/// Immutable map of AI providers, constructed once at startup and passed by
/// `Arc`. Tests substitute fakes by building their own registry.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn AiProvider>>,
    default_embedding: String,
}

impl ProviderRegistry {
    /// Build a registry from a provider list, embedding through
    /// [`DEFAULT_EMBEDDING_PROVIDER`].
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn AiProvider>>) -> Self {
        Self::with_default_embedding(providers, DEFAULT_EMBEDDING_PROVIDER)
    }

    /// Build a registry with an explicit default embedding provider id.
    #[must_use]
    pub fn with_default_embedding(
        providers: Vec<Arc<dyn AiProvider>>,
        default_embedding: &str,
    ) -> Self {
        let providers = providers
            .into_iter()
            .map(|p| (p.id().to_string(), p))
            .collect();
        Self {
            providers,
            default_embedding: default_embedding.to_string(),
        }
    }

    /// Build the standard registry from the environment: Gemini, OpenAI,
    /// and Ollama, each available only when its credentials/endpoint are
    /// configured.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(vec![
            Arc::new(crate::GeminiProvider::from_env()),
            Arc::new(crate::OpenAiProvider::from_env()),
            Arc::new(crate::OllamaProvider::from_env()),
        ])
    }

    /// Look up a provider by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn AiProvider>> {
        self.providers.get(id).cloned()
    }

    /// The fallback chat provider ([`DEFAULT_CHAT_PROVIDER`]), when present.
    #[must_use]
    pub fn default_chat(&self) -> Option<Arc<dyn AiProvider>> {
        self.get(DEFAULT_CHAT_PROVIDER)
    }

    /// The provider used for all embedding calls, when present.
    #[must_use]
    pub fn default_embedder(&self) -> Option<Arc<dyn AiProvider>> {
        self.get(&self.default_embedding)
    }

    /// All registered providers.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<dyn AiProvider>> {
        self.providers.values().cloned().collect()
    }

    /// All registered provider ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.providers.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ragspace_core::{ChatMessage, ModelInfo, ModelParameters, ProviderError, TokenStream};

    struct StaticProvider {
        id: &'static str,
    }

    #[async_trait]
    impl AiProvider for StaticProvider {
        fn id(&self) -> &str {
            self.id
        }

        fn name(&self) -> &str {
            self.id
        }

        fn models(&self) -> Vec<ModelInfo> {
            vec![]
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn stream(
            &self,
            _messages: &[ChatMessage],
            _model_id: &str,
            _params: Option<&ModelParameters>,
        ) -> Result<TokenStream, ProviderError> {
            Ok(Box::pin(futures::stream::empty()))
        }

        async fn embed_text(
            &self,
            _text: &str,
            _model_id: Option<&str>,
        ) -> Result<Vec<f32>, ProviderError> {
            Ok(vec![0.0])
        }
    }

    #[test]
    fn test_lookup_by_id() {
        let registry = ProviderRegistry::new(vec![
            Arc::new(StaticProvider { id: "gemini" }),
            Arc::new(StaticProvider { id: "openai" }),
        ]);

        assert!(registry.get("gemini").is_some());
        assert!(registry.get("openai").is_some());
        assert!(registry.get("claude").is_none());
        assert_eq!(registry.ids(), vec!["gemini", "openai"]);
    }

    #[test]
    fn test_default_chat_and_embedder() {
        let registry = ProviderRegistry::new(vec![Arc::new(StaticProvider { id: "gemini" })]);
        assert!(registry.default_chat().is_some());
        assert!(registry.default_embedder().is_some());
    }

    #[test]
    fn test_missing_default_embedder() {
        let registry = ProviderRegistry::new(vec![Arc::new(StaticProvider { id: "openai" })]);
        assert!(registry.default_embedder().is_none());
    }

    #[test]
    fn test_custom_default_embedder() {
        let registry = ProviderRegistry::with_default_embedding(
            vec![Arc::new(StaticProvider { id: "ollama" })],
            "ollama",
        );
        assert_eq!(registry.default_embedder().unwrap().id(), "ollama");
    }

    #[test]
    fn test_from_env_registers_standard_providers() {
        let registry = ProviderRegistry::from_env();
        assert_eq!(registry.ids(), vec!["gemini", "ollama", "openai"]);
    }
}
