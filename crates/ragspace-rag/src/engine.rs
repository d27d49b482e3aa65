//! The RAG engine.

use ragspace_core::{
    AiProvider, ChatMessage, Error, MetadataStore, Result, ScoredDocument, TokenStream,
    VectorStore,
};
use ragspace_providers::ProviderRegistry;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::retriever::{Retriever, DEFAULT_RETRIEVE_LIMIT};
use crate::router::ModelRouter;

/// System prompt used when no template is selected.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant for a professional services firm.\n\
Use the following context to answer the user's question.\n\
If the answer is not in the context, say you don't know.\n\
Always cite your sources using [Source: Title] format if possible.";

/// Title used in a context header when the parent document is gone.
const UNKNOWN_SOURCE: &str = "Unknown";

/// The two outputs of a query: the provider's token stream, and the
/// retrieved chunks for citation display. Citations are computed once,
/// before any token flows, and are not updated as streaming proceeds.
pub struct RagResponse {
    pub stream: TokenStream,
    pub citations: Vec<ScoredDocument>,
}

/// Orchestrates Retriever + Model Router + a streaming chat provider.
pub struct RagEngine {
    metadata: Arc<dyn MetadataStore>,
    retriever: Retriever,
    router: ModelRouter,
}

impl RagEngine {
    /// Wire up the engine. Fails when the registry has no default embedding
    /// provider, since retrieval cannot work without one.
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        vectors: Arc<dyn VectorStore>,
        providers: Arc<ProviderRegistry>,
    ) -> Result<Self> {
        let embedder = providers.default_embedder().ok_or_else(|| {
            Error::Config("no default embedding provider registered".to_string())
        })?;

        Ok(Self {
            metadata: Arc::clone(&metadata),
            retriever: Retriever::new(Arc::clone(&metadata), vectors, embedder),
            router: ModelRouter::new(metadata, providers),
        })
    }

    /// Answer a query with retrieved context.
    ///
    /// Retrieval fully completes before the chat stream begins; there is no
    /// overlap between the two. No timeout or cancellation is enforced here
    /// beyond what the transport provides.
    pub async fn query(
        &self,
        workspace_id: Uuid,
        query: &str,
        template_id: Option<Uuid>,
    ) -> Result<RagResponse> {
        let citations = self
            .retriever
            .retrieve(workspace_id, query, DEFAULT_RETRIEVE_LIMIT)
            .await?;

        let mut system_prompt = DEFAULT_SYSTEM_PROMPT.to_string();
        if let Some(template_id) = template_id {
            if let Some(template) = self.metadata.template(template_id).await? {
                system_prompt = template.prompt;
            }
        }

        let context_text = citations
            .iter()
            .map(|doc| {
                let title = doc
                    .document
                    .as_ref()
                    .map_or(UNKNOWN_SOURCE, |d| d.title.as_str());
                format!("[Source: {title}]\n{}", doc.content)
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut final_prompt = format!("{system_prompt}\n\nContext:\n{context_text}");

        let resolved = self.router.resolve(workspace_id, template_id).await?;

        // A preset-level system prompt overrides the one above; the context
        // block is re-appended to it so retrieval still reaches the model.
        if let Some(preset_prompt) = &resolved.preset.system_prompt {
            final_prompt = format!("{preset_prompt}\n\nContext:\n{context_text}");
        }

        let messages = vec![
            ChatMessage::system(final_prompt),
            ChatMessage::user(query),
        ];

        debug!(
            "querying {}/{} with {} citations",
            resolved.preset.model.provider_id,
            resolved.preset.model.model_id,
            citations.len()
        );

        let stream = resolved
            .provider
            .stream(
                &messages,
                &resolved.preset.model.model_id,
                resolved.preset.parameters.as_ref(),
            )
            .await?;

        Ok(RagResponse { stream, citations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::result::Result;
    use async_trait::async_trait;
    use futures::StreamExt;
    use ragspace_core::{
        AiProvider, ChunkRecord, MetadataStore, ModelInfo, ModelParameters, NewDocument,
        NewTemplate, ProviderError,
    };
    use ragspace_store::MemoryStore;
    use serde_json::json;
    use std::sync::Mutex;

    /// Chat provider that records the last message list and streams canned
    /// fragments.
    struct RecordingProvider {
        id: &'static str,
        fragments: Vec<&'static str>,
        last_messages: Mutex<Vec<ChatMessage>>,
        last_model: Mutex<String>,
    }

    impl RecordingProvider {
        fn new(id: &'static str, fragments: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                id,
                fragments,
                last_messages: Mutex::new(Vec::new()),
                last_model: Mutex::new(String::new()),
            })
        }

        fn system_prompt(&self) -> String {
            self.last_messages.lock().unwrap()[0].content.clone()
        }
    }

    #[async_trait]
    impl AiProvider for RecordingProvider {
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
            messages: &[ChatMessage],
            model_id: &str,
            _params: Option<&ModelParameters>,
        ) -> Result<TokenStream, ProviderError> {
            *self.last_messages.lock().unwrap() = messages.to_vec();
            *self.last_model.lock().unwrap() = model_id.to_string();
            let fragments: Vec<Result<String, ProviderError>> = self
                .fragments
                .iter()
                .map(|f| Ok((*f).to_string()))
                .collect();
            Ok(Box::pin(futures::stream::iter(fragments)))
        }

        async fn embed_text(
            &self,
            _text: &str,
            _model_id: Option<&str>,
        ) -> Result<Vec<f32>, ProviderError> {
            Ok(vec![1.0, 0.0])
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        provider: Arc<RecordingProvider>,
        engine: RagEngine,
        workspace_id: Uuid,
    }

    async fn fixture(model_config: Option<serde_json::Value>) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let workspace = store.create_workspace("acme", model_config).await.unwrap();

        let provider = RecordingProvider::new("gemini", vec!["Hello", ", ", "world"]);
        let registry = Arc::new(ProviderRegistry::new(vec![
            Arc::clone(&provider) as Arc<dyn AiProvider>
        ]));

        let engine = RagEngine::new(
            Arc::clone(&store) as Arc<dyn MetadataStore>,
            Arc::clone(&store) as Arc<dyn VectorStore>,
            registry,
        )
        .unwrap();

        Fixture {
            store,
            provider,
            engine,
            workspace_id: workspace.id,
        }
    }

    async fn seed_chunk(fx: &Fixture, title: &str, content: &str) {
        let doc = fx
            .store
            .upsert_document(NewDocument {
                workspace_id: fx.workspace_id,
                data_source_id: None,
                external_id: format!("/data/{title}"),
                title: title.to_string(),
                content: content.to_string(),
                metadata: json!({}),
            })
            .await
            .unwrap()
            .document;

        fx.store
            .add_chunks(&[ChunkRecord {
                document_id: doc.id,
                content: content.to_string(),
                embedding: Some(vec![1.0, 0.0]),
                index: 0,
                metadata: json!({"documentId": doc.id}),
            }])
            .await
            .unwrap();
    }

    async fn drain(stream: TokenStream) -> String {
        stream
            .filter_map(|item| async { item.ok() })
            .collect::<Vec<String>>()
            .await
            .concat()
    }

    #[tokio::test]
    async fn test_empty_workspace_query() {
        let fx = fixture(None).await;

        let response = fx
            .engine
            .query(fx.workspace_id, "What is the plan?", None)
            .await
            .unwrap();

        assert!(response.citations.is_empty());
        assert_eq!(drain(response.stream).await, "Hello, world");

        // No context was injected, though the prompt still instructs the
        // citation format
        let prompt = fx.provider.system_prompt();
        assert!(prompt.ends_with("Context:\n"));
        assert!(prompt.contains("[Source: Title]"));
    }

    #[tokio::test]
    async fn test_citations_and_context_block() {
        let fx = fixture(None).await;
        seed_chunk(&fx, "handbook.md", "Remote work is allowed.").await;

        let response = fx
            .engine
            .query(fx.workspace_id, "Can I work remotely?", None)
            .await
            .unwrap();

        assert_eq!(response.citations.len(), 1);
        assert_eq!(
            response.citations[0].document.as_ref().unwrap().title,
            "handbook.md"
        );

        let prompt = fx.provider.system_prompt();
        assert!(prompt.contains("[Source: handbook.md]\nRemote work is allowed."));
        // User message carries the raw query
        let messages = fx.provider.last_messages.lock().unwrap().clone();
        assert_eq!(messages[1].content, "Can I work remotely?");
    }

    #[tokio::test]
    async fn test_template_prompt_replaces_default() {
        let fx = fixture(None).await;
        let template = fx
            .store
            .create_template(NewTemplate {
                workspace_id: fx.workspace_id,
                name: "legal".to_string(),
                prompt: "You are a legal analyst.".to_string(),
                kind: "chat".to_string(),
                config: json!({}),
            })
            .await
            .unwrap();

        fx.engine
            .query(fx.workspace_id, "q", Some(template.id))
            .await
            .unwrap();

        let prompt = fx.provider.system_prompt();
        assert!(prompt.starts_with("You are a legal analyst."));
        assert!(!prompt.contains("professional services firm"));
    }

    #[tokio::test]
    async fn test_preset_system_prompt_override_reappends_context() {
        let fx = fixture(Some(json!({
            "model": {"providerId": "gemini", "modelId": "gemini-pro"},
            "systemPrompt": "Answer like a pirate."
        })))
        .await;
        seed_chunk(&fx, "map.txt", "The treasure is buried north.").await;

        fx.engine.query(fx.workspace_id, "where?", None).await.unwrap();

        let prompt = fx.provider.system_prompt();
        // The override wins and the context block is appended to it
        assert!(prompt.starts_with("Answer like a pirate."));
        assert!(prompt.contains("[Source: map.txt]\nThe treasure is buried north."));
        assert!(!prompt.contains("professional services firm"));
    }

    #[tokio::test]
    async fn test_model_id_from_workspace_config() {
        let fx = fixture(Some(json!({
            "model": {"providerId": "gemini", "modelId": "gemini-1.5-flash"}
        })))
        .await;

        fx.engine.query(fx.workspace_id, "q", None).await.unwrap();

        assert_eq!(*fx.provider.last_model.lock().unwrap(), "gemini-1.5-flash");
    }

    #[tokio::test]
    async fn test_unknown_workspace_is_not_found() {
        let fx = fixture(None).await;

        let result = fx.engine.query(Uuid::new_v4(), "q", None).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_engine_requires_default_embedder() {
        let store = Arc::new(MemoryStore::new());
        let provider = RecordingProvider::new("openai", vec![]);
        let registry = Arc::new(ProviderRegistry::new(vec![
            provider as Arc<dyn AiProvider>
        ]));

        let result = RagEngine::new(
            Arc::clone(&store) as Arc<dyn MetadataStore>,
            store as Arc<dyn VectorStore>,
            registry,
        );

        assert!(matches!(result, Err(Error::Config(_))));
    }
}
