//! Model resolution.

use ragspace_core::{AiProvider, Error, MetadataStore, ModelPreset, ModelRef, Result};
use ragspace_providers::ProviderRegistry;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// A resolved provider plus the preset to drive it with.
pub struct ResolvedModel {
    pub provider: Arc<dyn AiProvider>,
    pub preset: ModelPreset,
}

/// Resolves which provider/model/parameters apply for a workspace and
/// optional template.
pub struct ModelRouter {
    metadata: Arc<dyn MetadataStore>,
    providers: Arc<ProviderRegistry>,
}

impl ModelRouter {
    pub fn new(metadata: Arc<dyn MetadataStore>, providers: Arc<ProviderRegistry>) -> Self {
        Self {
            metadata,
            providers,
        }
    }

    /// Resolution order, first match wins:
    ///
    /// 1. the template's config, when `template_id` is given and the stored
    ///    JSON carries a valid `model` shape
    /// 2. the workspace's `model_config`, either the current preset shape or the
    ///    legacy flat `{providerId, modelId}` shape
    /// 3. the system default (Gemini, temperature 0.7)
    ///
    /// An unregistered provider id falls back to the default Gemini
    /// provider with a warning instead of failing the request. Whether the
    /// resolved provider is actually available (API key configured) is the
    /// caller's concern.
    pub async fn resolve(
        &self,
        workspace_id: Uuid,
        template_id: Option<Uuid>,
    ) -> Result<ResolvedModel> {
        let workspace = self
            .metadata
            .workspace(workspace_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("workspace {workspace_id}")))?;

        let mut preset: Option<ModelPreset> = None;

        if let Some(template_id) = template_id {
            if let Some(template) = self.metadata.template(template_id).await? {
                preset = ModelPreset::from_value(&template.config);
            }
        }

        if preset.is_none() {
            if let Some(config) = &workspace.model_config {
                preset = ModelPreset::from_value(config)
                    .or_else(|| ModelPreset::from_legacy_value(config));
            }
        }

        let mut preset = preset.unwrap_or_else(ModelPreset::system_default);
        debug!(
            "resolved model {}/{} for workspace {workspace_id}",
            preset.model.provider_id, preset.model.model_id
        );

        match self.providers.get(&preset.model.provider_id) {
            Some(provider) => Ok(ResolvedModel { provider, preset }),
            None => {
                warn!(
                    "provider {} not registered, falling back to gemini",
                    preset.model.provider_id
                );
                let provider = self.providers.default_chat().ok_or_else(|| {
                    Error::Config("fallback provider gemini is not registered".to_string())
                })?;
                preset.model = ModelRef {
                    provider_id: "gemini".to_string(),
                    model_id: "gemini-pro".to_string(),
                };
                Ok(ResolvedModel { provider, preset })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::result::Result;
    use async_trait::async_trait;
    use ragspace_core::{
        ChatMessage, MetadataStore, ModelInfo, ModelParameters, NewTemplate, ProviderError,
        TokenStream,
    };
    use ragspace_store::MemoryStore;
    use serde_json::json;

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

    fn registry() -> Arc<ProviderRegistry> {
        Arc::new(ProviderRegistry::new(vec![
            Arc::new(StaticProvider { id: "gemini" }),
            Arc::new(StaticProvider { id: "openai" }),
        ]))
    }

    async fn router_with_store() -> (ModelRouter, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let router = ModelRouter::new(
            Arc::clone(&store) as Arc<dyn MetadataStore>,
            registry(),
        );
        (router, store)
    }

    #[tokio::test]
    async fn test_missing_workspace_is_not_found() {
        let (router, _store) = router_with_store().await;
        let result = router.resolve(Uuid::new_v4(), None).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_system_default_when_nothing_configured() {
        let (router, store) = router_with_store().await;
        let ws = store.create_workspace("acme", None).await.unwrap();

        let resolved = router.resolve(ws.id, None).await.unwrap();

        assert_eq!(resolved.provider.id(), "gemini");
        assert_eq!(resolved.preset.model.model_id, "gemini-pro");
        assert_eq!(
            resolved.preset.parameters.unwrap().temperature,
            Some(0.7)
        );
    }

    #[tokio::test]
    async fn test_template_config_wins() {
        let (router, store) = router_with_store().await;
        let ws = store
            .create_workspace(
                "acme",
                Some(json!({"model": {"providerId": "gemini", "modelId": "gemini-pro"}})),
            )
            .await
            .unwrap();
        let template = store
            .create_template(NewTemplate {
                workspace_id: ws.id,
                name: "analysis".to_string(),
                prompt: "Analyse.".to_string(),
                kind: "chat".to_string(),
                config: json!({"model": {"providerId": "openai", "modelId": "gpt-4o"}}),
            })
            .await
            .unwrap();

        let resolved = router.resolve(ws.id, Some(template.id)).await.unwrap();

        assert_eq!(resolved.provider.id(), "openai");
        assert_eq!(resolved.preset.model.model_id, "gpt-4o");
    }

    #[tokio::test]
    async fn test_template_without_model_key_falls_through() {
        let (router, store) = router_with_store().await;
        let ws = store
            .create_workspace(
                "acme",
                Some(json!({"model": {"providerId": "openai", "modelId": "gpt-4o-mini"}})),
            )
            .await
            .unwrap();
        let template = store
            .create_template(NewTemplate {
                workspace_id: ws.id,
                name: "broken".to_string(),
                prompt: "p".to_string(),
                kind: "chat".to_string(),
                config: json!({"temperature": 0.1}),
            })
            .await
            .unwrap();

        // Malformed template config falls through to the workspace default
        let resolved = router.resolve(ws.id, Some(template.id)).await.unwrap();

        assert_eq!(resolved.provider.id(), "openai");
        assert_eq!(resolved.preset.model.model_id, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_legacy_workspace_config_shape() {
        let (router, store) = router_with_store().await;
        let ws = store
            .create_workspace(
                "acme",
                Some(json!({"providerId": "openai", "modelId": "gpt-4o"})),
            )
            .await
            .unwrap();

        let resolved = router.resolve(ws.id, None).await.unwrap();

        assert_eq!(resolved.provider.id(), "openai");
        assert_eq!(resolved.preset.model.model_id, "gpt-4o");
        // Legacy shape gains default parameters
        assert_eq!(resolved.preset.parameters.unwrap().temperature, Some(0.7));
    }

    #[tokio::test]
    async fn test_unknown_provider_falls_back_to_gemini() {
        let (router, store) = router_with_store().await;
        let ws = store
            .create_workspace(
                "acme",
                Some(json!({"model": {"providerId": "claude", "modelId": "claude-3"}})),
            )
            .await
            .unwrap();

        let resolved = router.resolve(ws.id, None).await.unwrap();

        assert_eq!(resolved.provider.id(), "gemini");
        assert_eq!(resolved.preset.model.model_id, "gemini-pro");
    }

    #[tokio::test]
    async fn test_missing_template_uses_workspace_config() {
        let (router, store) = router_with_store().await;
        let ws = store
            .create_workspace(
                "acme",
                Some(json!({"model": {"providerId": "openai", "modelId": "gpt-4o"}})),
            )
            .await
            .unwrap();

        let resolved = router.resolve(ws.id, Some(Uuid::new_v4())).await.unwrap();
        assert_eq!(resolved.provider.id(), "openai");
    }
}
