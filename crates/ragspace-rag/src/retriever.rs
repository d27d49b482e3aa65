//! Query-time retrieval.

use ragspace_core::{
    AiProvider, DocumentRef, MetadataStore, Result, ScoredDocument, VectorStore,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Default number of chunks retrieved per query.
pub const DEFAULT_RETRIEVE_LIMIT: usize = 5;

/// Embeds a query, searches the vector store, and enriches hits with their
/// parent document for citation display.
pub struct Retriever {
    metadata: Arc<dyn MetadataStore>,
    vectors: Arc<dyn VectorStore>,
    embedder: Arc<dyn AiProvider>,
}

impl Retriever {
    /// `embedder` must be the same provider ingestion embeds with, so stored
    /// and query vectors share one space.
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        vectors: Arc<dyn VectorStore>,
        embedder: Arc<dyn AiProvider>,
    ) -> Self {
        Self {
            metadata,
            vectors,
            embedder,
        }
    }

    /// Retrieve the `limit` most similar chunks in the workspace.
    ///
    /// Hits whose parent document has been deleted keep `document: None`
    /// rather than failing the retrieval.
    pub async fn retrieve(
        &self,
        workspace_id: Uuid,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ScoredDocument>> {
        let embedding = self.embedder.embed_text(query, None).await?;

        let hits = self
            .vectors
            .similarity_search(&embedding, limit, workspace_id)
            .await?;
        debug!("retrieved {} chunks for workspace {workspace_id}", hits.len());

        let mut document_ids: Vec<Uuid> = hits
            .iter()
            .filter_map(|hit| document_id_of(&hit.metadata))
            .collect();
        document_ids.sort();
        document_ids.dedup();

        let documents = self.metadata.documents_by_ids(&document_ids).await?;
        let by_id: HashMap<Uuid, DocumentRef> = documents
            .into_iter()
            .map(|d| {
                (
                    d.id,
                    DocumentRef {
                        title: d.title,
                        external_id: Some(d.external_id),
                    },
                )
            })
            .collect();

        Ok(hits
            .into_iter()
            .map(|hit| {
                let document = document_id_of(&hit.metadata).and_then(|id| by_id.get(&id).cloned());
                ScoredDocument::from_chunk(hit, document)
            })
            .collect())
    }
}

/// Pull the parent document id out of chunk metadata.
fn document_id_of(metadata: &serde_json::Value) -> Option<Uuid> {
    metadata
        .get("documentId")
        .and_then(serde_json::Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::result::Result;
    use async_trait::async_trait;
    use ragspace_core::{
        ChatMessage, ChunkRecord, ModelInfo, ModelParameters, NewDocument, ProviderError,
        ScoredChunk, StoreError, TokenStream,
    };
    use ragspace_store::MemoryStore;
    use serde_json::json;

    struct FixedEmbedder;

    #[async_trait]
    impl AiProvider for FixedEmbedder {
        fn id(&self) -> &str {
            "mock"
        }

        fn name(&self) -> &str {
            "Mock"
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
            Ok(vec![1.0, 0.0])
        }
    }

    /// Vector store that returns canned hits, including dangling document
    /// references.
    struct CannedVectors {
        hits: Vec<ScoredChunk>,
    }

    #[async_trait]
    impl VectorStore for CannedVectors {
        async fn add_chunks(&self, _chunks: &[ChunkRecord]) -> Result<(), StoreError> {
            Ok(())
        }

        async fn delete_chunks(&self, _document_id: Uuid) -> Result<u64, StoreError> {
            Ok(0)
        }

        async fn similarity_search(
            &self,
            _query: &[f32],
            limit: usize,
            _workspace_id: Uuid,
        ) -> Result<Vec<ScoredChunk>, StoreError> {
            Ok(self.hits.iter().take(limit).cloned().collect())
        }
    }

    #[tokio::test]
    async fn test_retrieve_enriches_with_document_titles() {
        let store = Arc::new(MemoryStore::new());
        let ws = store.create_workspace("acme", None).await.unwrap();
        let doc = store
            .upsert_document(NewDocument {
                workspace_id: ws.id,
                data_source_id: None,
                external_id: "/data/guide.md".to_string(),
                title: "guide.md".to_string(),
                content: "A guide.".to_string(),
                metadata: json!({}),
            })
            .await
            .unwrap()
            .document;

        store
            .add_chunks(&[ChunkRecord {
                document_id: doc.id,
                content: "A guide.".to_string(),
                embedding: Some(vec![1.0, 0.0]),
                index: 0,
                metadata: json!({"documentId": doc.id}),
            }])
            .await
            .unwrap();

        let retriever = Retriever::new(
            Arc::clone(&store) as Arc<dyn MetadataStore>,
            Arc::clone(&store) as Arc<dyn VectorStore>,
            Arc::new(FixedEmbedder),
        );

        let results = retriever.retrieve(ws.id, "guides?", 5).await.unwrap();

        assert_eq!(results.len(), 1);
        let document = results[0].document.as_ref().unwrap();
        assert_eq!(document.title, "guide.md");
        assert_eq!(document.external_id.as_deref(), Some("/data/guide.md"));
    }

    #[tokio::test]
    async fn test_retrieve_tolerates_deleted_document() {
        let store = Arc::new(MemoryStore::new());
        let ws = store.create_workspace("acme", None).await.unwrap();

        let dangling = Uuid::new_v4();
        let vectors = Arc::new(CannedVectors {
            hits: vec![ScoredChunk {
                id: Uuid::new_v4(),
                content: "orphaned".to_string(),
                metadata: json!({"documentId": dangling}),
                score: 0.9,
            }],
        });

        let retriever = Retriever::new(
            Arc::clone(&store) as Arc<dyn MetadataStore>,
            vectors,
            Arc::new(FixedEmbedder),
        );

        let results = retriever.retrieve(ws.id, "anything", 5).await.unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].document.is_none());
        assert_eq!(results[0].content, "orphaned");
    }

    #[tokio::test]
    async fn test_retrieve_empty_workspace() {
        let store = Arc::new(MemoryStore::new());
        let ws = store.create_workspace("acme", None).await.unwrap();

        let retriever = Retriever::new(
            Arc::clone(&store) as Arc<dyn MetadataStore>,
            Arc::clone(&store) as Arc<dyn VectorStore>,
            Arc::new(FixedEmbedder),
        );

        let results = retriever.retrieve(ws.id, "anything", 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_handles_metadata_without_document_id() {
        let store = Arc::new(MemoryStore::new());
        let ws = store.create_workspace("acme", None).await.unwrap();

        let vectors = Arc::new(CannedVectors {
            hits: vec![ScoredChunk {
                id: Uuid::new_v4(),
                content: "no provenance".to_string(),
                metadata: json!({}),
                score: 0.5,
            }],
        });

        let retriever = Retriever::new(
            Arc::clone(&store) as Arc<dyn MetadataStore>,
            vectors,
            Arc::new(FixedEmbedder),
        );

        let results = retriever.retrieve(ws.id, "anything", 5).await.unwrap();
        assert!(results[0].document.is_none());
    }
}
