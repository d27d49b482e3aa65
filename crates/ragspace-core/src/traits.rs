//! Core traits for ragspace components.
//!
//! - [`Connector`]: list and read files from an external data source
//! - [`AiProvider`]: streaming chat completion and text embeddings
//! - [`VectorStore`]: chunk persistence and similarity search
//! - [`MetadataStore`]: workspace/document/data-source/template records
//!
//! Components are held as `Arc<dyn Trait>` and wired together at startup, so
//! tests can substitute fakes without touching ambient global state.

use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;
use std::pin::Pin;
use uuid::Uuid;

use crate::error::{ConnectError, ProviderError, StoreError};
use crate::types::{
    ChatMessage, ChunkRecord, DataSource, Document, DocumentUpsert, FileObject, ModelInfo,
    ModelParameters, NewDocument, NewTemplate, ScoredChunk, Template, Workspace,
};

/// A stream of response text fragments from a chat provider.
///
/// Restartable per call, not restartable mid-stream.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

// ============================================================================
// Connectors
// ============================================================================

/// Uniform listing/reading interface over an external data source.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connector kind, matched against [`DataSource::kind`].
    fn kind(&self) -> &str;

    /// Check whether a stored config is usable by this connector.
    async fn validate_config(&self, config: &Value) -> Result<bool, ConnectError>;

    /// List entries, optionally under a sub-path of the configured root.
    async fn list_files(
        &self,
        config: &Value,
        sub_path: Option<&str>,
    ) -> Result<Vec<FileObject>, ConnectError>;

    /// Read the raw bytes of a file by its connector-native identifier.
    async fn get_file_content(&self, config: &Value, file_id: &str)
        -> Result<Vec<u8>, ConnectError>;
}

// ============================================================================
// AI Providers
// ============================================================================

/// An external model provider: streaming chat plus text embeddings.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Stable provider identifier (e.g. `"gemini"`).
    fn id(&self) -> &str;

    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Models this provider offers.
    fn models(&self) -> Vec<ModelInfo>;

    /// Whether the provider is configured (API key / endpoint present).
    /// Checked by callers; resolution itself never fails on availability.
    async fn is_available(&self) -> bool;

    /// Stream a chat completion as text fragments.
    async fn stream(
        &self,
        messages: &[ChatMessage],
        model_id: &str,
        params: Option<&ModelParameters>,
    ) -> Result<TokenStream, ProviderError>;

    /// Embed a text span into a fixed-length vector.
    async fn embed_text(
        &self,
        text: &str,
        model_id: Option<&str>,
    ) -> Result<Vec<f32>, ProviderError>;
}

// ============================================================================
// Vector Storage
// ============================================================================

/// Chunk persistence and workspace-scoped similarity search.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Bulk-insert chunks. Embeddings are serialized to raw bytes by the
    /// store.
    async fn add_chunks(&self, chunks: &[ChunkRecord]) -> Result<(), StoreError>;

    /// Delete all chunks belonging to a document. Returns the count removed.
    async fn delete_chunks(&self, document_id: Uuid) -> Result<u64, StoreError>;

    /// Brute-force cosine similarity over every chunk in the workspace,
    /// sorted descending and truncated to `limit`.
    ///
    /// Chunks with no stored embedding score `-1.0` and sort last. An empty
    /// corpus returns an empty list, never an error.
    async fn similarity_search(
        &self,
        query: &[f32],
        limit: usize,
        workspace_id: Uuid,
    ) -> Result<Vec<ScoredChunk>, StoreError>;
}

// ============================================================================
// Metadata Storage
// ============================================================================

/// CRUD over workspace-scoped records. Assumed transactional per call; the
/// core does not wrap multi-statement transactions around it.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn create_workspace(
        &self,
        name: &str,
        model_config: Option<Value>,
    ) -> Result<Workspace, StoreError>;

    async fn workspace(&self, id: Uuid) -> Result<Option<Workspace>, StoreError>;

    async fn create_data_source(
        &self,
        workspace_id: Uuid,
        name: &str,
        kind: &str,
        config: Value,
    ) -> Result<DataSource, StoreError>;

    async fn data_source(&self, id: Uuid) -> Result<Option<DataSource>, StoreError>;

    /// Data sources for a workspace, newest first.
    async fn data_sources(&self, workspace_id: Uuid) -> Result<Vec<DataSource>, StoreError>;

    /// Create or update a document by `(workspace_id, data_source_id,
    /// external_id)`. On update the content and metadata are replaced and
    /// `replaced` is set so the caller clears prior chunks.
    async fn upsert_document(&self, new: NewDocument) -> Result<DocumentUpsert, StoreError>;

    async fn document(&self, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// Batch lookup for citation enrichment. Missing ids are simply absent
    /// from the result.
    async fn documents_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Document>, StoreError>;

    async fn create_template(&self, new: NewTemplate) -> Result<Template, StoreError>;

    async fn template(&self, id: Uuid) -> Result<Option<Template>, StoreError>;
}
