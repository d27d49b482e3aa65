//! In-memory store for tests and development.

use async_trait::async_trait;
use chrono::Utc;
use ragspace_core::{
    cosine_similarity, embedding_from_bytes, embedding_to_bytes, ChunkRecord, DataSource,
    Document, DocumentChunk, DocumentUpsert, MetadataStore, NewDocument, NewTemplate, ScoredChunk,
    StoreError, Template, VectorStore, Workspace,
};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// In-memory implementation of [`MetadataStore`] and [`VectorStore`].
///
/// Keeps all records in `RwLock`-guarded maps and searches with brute-force
/// cosine similarity. Not suitable for production, ideal for tests and
/// development builds.
#[derive(Default)]
pub struct MemoryStore {
    workspaces: Arc<RwLock<HashMap<Uuid, Workspace>>>,
    data_sources: Arc<RwLock<HashMap<Uuid, DataSource>>>,
    documents: Arc<RwLock<HashMap<Uuid, Document>>>,
    templates: Arc<RwLock<HashMap<Uuid, Template>>>,
    chunks: Arc<RwLock<HashMap<Uuid, DocumentChunk>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored chunks, across all workspaces.
    pub async fn chunk_count(&self) -> usize {
        self.chunks.read().await.len()
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn create_workspace(
        &self,
        name: &str,
        model_config: Option<Value>,
    ) -> Result<Workspace, StoreError> {
        let workspace = Workspace {
            id: Uuid::new_v4(),
            name: name.to_string(),
            model_config,
            created_at: Utc::now(),
        };
        self.workspaces
            .write()
            .await
            .insert(workspace.id, workspace.clone());
        Ok(workspace)
    }

    async fn workspace(&self, id: Uuid) -> Result<Option<Workspace>, StoreError> {
        Ok(self.workspaces.read().await.get(&id).cloned())
    }

    async fn create_data_source(
        &self,
        workspace_id: Uuid,
        name: &str,
        kind: &str,
        config: Value,
    ) -> Result<DataSource, StoreError> {
        let data_source = DataSource {
            id: Uuid::new_v4(),
            workspace_id,
            name: name.to_string(),
            kind: kind.to_string(),
            config,
            created_at: Utc::now(),
        };
        self.data_sources
            .write()
            .await
            .insert(data_source.id, data_source.clone());
        Ok(data_source)
    }

    async fn data_source(&self, id: Uuid) -> Result<Option<DataSource>, StoreError> {
        Ok(self.data_sources.read().await.get(&id).cloned())
    }

    async fn data_sources(&self, workspace_id: Uuid) -> Result<Vec<DataSource>, StoreError> {
        let mut sources: Vec<DataSource> = self
            .data_sources
            .read()
            .await
            .values()
            .filter(|ds| ds.workspace_id == workspace_id)
            .cloned()
            .collect();
        sources.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sources)
    }

    async fn upsert_document(&self, new: NewDocument) -> Result<DocumentUpsert, StoreError> {
        let mut documents = self.documents.write().await;
        let now = Utc::now();

        let existing = documents
            .values()
            .find(|d| {
                d.workspace_id == new.workspace_id
                    && d.data_source_id == new.data_source_id
                    && d.external_id == new.external_id
            })
            .map(|d| d.id);

        if let Some(id) = existing {
            let document = documents
                .get_mut(&id)
                .ok_or_else(|| StoreError::Query("document vanished during upsert".to_string()))?;
            document.title = new.title;
            document.content = new.content;
            document.metadata = new.metadata;
            document.updated_at = now;
            debug!("updated document {id}");
            return Ok(DocumentUpsert {
                document: document.clone(),
                replaced: true,
            });
        }

        let document = Document {
            id: Uuid::new_v4(),
            workspace_id: new.workspace_id,
            data_source_id: new.data_source_id,
            external_id: new.external_id,
            title: new.title,
            content: new.content,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        };
        documents.insert(document.id, document.clone());
        debug!("created document {}", document.id);
        Ok(DocumentUpsert {
            document,
            replaced: false,
        })
    }

    async fn document(&self, id: Uuid) -> Result<Option<Document>, StoreError> {
        Ok(self.documents.read().await.get(&id).cloned())
    }

    async fn documents_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Document>, StoreError> {
        let documents = self.documents.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| documents.get(id).cloned())
            .collect())
    }

    async fn create_template(&self, new: NewTemplate) -> Result<Template, StoreError> {
        let template = Template {
            id: Uuid::new_v4(),
            workspace_id: new.workspace_id,
            name: new.name,
            prompt: new.prompt,
            kind: new.kind,
            config: new.config,
            created_at: Utc::now(),
        };
        self.templates
            .write()
            .await
            .insert(template.id, template.clone());
        Ok(template)
    }

    async fn template(&self, id: Uuid) -> Result<Option<Template>, StoreError> {
        Ok(self.templates.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn add_chunks(&self, chunks: &[ChunkRecord]) -> Result<(), StoreError> {
        let mut store = self.chunks.write().await;
        for record in chunks {
            let chunk = DocumentChunk {
                id: Uuid::new_v4(),
                document_id: record.document_id,
                content: record.content.clone(),
                embedding: record.embedding.as_deref().map(embedding_to_bytes),
                index: record.index,
                metadata: record.metadata.clone(),
            };
            store.insert(chunk.id, chunk);
        }
        debug!("added {} chunks", chunks.len());
        Ok(())
    }

    async fn delete_chunks(&self, document_id: Uuid) -> Result<u64, StoreError> {
        let mut chunks = self.chunks.write().await;
        let before = chunks.len();
        chunks.retain(|_, chunk| chunk.document_id != document_id);
        let deleted = (before - chunks.len()) as u64;
        debug!("deleted {deleted} chunks for document {document_id}");
        Ok(deleted)
    }

    async fn similarity_search(
        &self,
        query: &[f32],
        limit: usize,
        workspace_id: Uuid,
    ) -> Result<Vec<ScoredChunk>, StoreError> {
        let workspace_docs: HashSet<Uuid> = self
            .documents
            .read()
            .await
            .values()
            .filter(|d| d.workspace_id == workspace_id)
            .map(|d| d.id)
            .collect();

        let chunks = self.chunks.read().await;
        let mut results: Vec<ScoredChunk> = chunks
            .values()
            .filter(|chunk| workspace_docs.contains(&chunk.document_id))
            .map(|chunk| {
                // Missing embedding scores the sentinel -1.0 so the chunk
                // sorts last instead of breaking the comparison.
                let score = chunk
                    .embedding
                    .as_deref()
                    .and_then(embedding_from_bytes)
                    .map_or(-1.0, |embedding| cosine_similarity(query, &embedding));
                ScoredChunk {
                    id: chunk.id,
                    content: chunk.content.clone(),
                    metadata: chunk.metadata.clone(),
                    score,
                }
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);
        Ok(results)
    }
}
