//! The ingestion pipeline.
//!
//! One file flows through: resolve data source → connector → fetch bytes →
//! extract text → upsert document → chunk → embed → store chunks. Each step
//! is a hard dependency on the previous one succeeding. There is no per-file
//! retry; a provider failure aborts that file, and already-committed chunk
//! deletion and document upsert are not rolled back (re-ingesting repairs
//! the document).

use futures::future::try_join_all;
use ragspace_connect::ConnectorRegistry;
use ragspace_core::{
    AiProvider, ChunkRecord, Connector, Error, FileKind, FileObject, MetadataStore, NewDocument,
    ProviderError, Result, VectorStore,
};
use ragspace_extract::extract_text;
use ragspace_chunker::{chunk_text, DEFAULT_CHUNK_SIZE};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use uuid::Uuid;

/// Pipeline tuning knobs.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Chunk size in characters
    pub chunk_size: usize,
    /// Cap on files per batch ingestion trigger
    pub max_files: usize,
    /// Concurrent embedding calls per document
    pub embed_concurrency: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_files: 5,
            embed_concurrency: 4,
        }
    }
}

/// Outcome of a batch ingestion trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Files ingested (including empty-extraction files that produced no
    /// chunks)
    pub ingested: u32,
    /// Files that failed and were skipped
    pub failed: u32,
    /// Total chunks written
    pub chunks: u32,
}

/// Orchestrates Connector → Extractor → Chunker → Embedder → Vector Store.
pub struct IngestionPipeline {
    metadata: Arc<dyn MetadataStore>,
    vectors: Arc<dyn VectorStore>,
    connectors: Arc<ConnectorRegistry>,
    embedder: Arc<dyn AiProvider>,
    config: IngestConfig,
}

impl IngestionPipeline {
    /// Wire up a pipeline. `embedder` is the registry's default embedding
    /// provider; retrieval must embed through the same one.
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        vectors: Arc<dyn VectorStore>,
        connectors: Arc<ConnectorRegistry>,
        embedder: Arc<dyn AiProvider>,
        config: IngestConfig,
    ) -> Self {
        Self {
            metadata,
            vectors,
            connectors,
            embedder,
            config,
        }
    }

    /// Ingest a single file. Returns the number of chunks written; zero when
    /// extraction yields no text (logged, not an error).
    pub async fn ingest_document(
        &self,
        workspace_id: Uuid,
        data_source_id: Uuid,
        file: &FileObject,
    ) -> Result<u32> {
        info!("ingesting {} ({})", file.name, file.id);

        let data_source = self
            .metadata
            .data_source(data_source_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("data source {data_source_id}")))?;

        let connector = self
            .connectors
            .get(&data_source.kind)
            .ok_or_else(|| Error::NotFound(format!("connector kind {}", data_source.kind)))?;

        let bytes = connector
            .get_file_content(&data_source.config, &file.id)
            .await?;

        let mime_type = file.mime_type.as_deref().unwrap_or("text/plain");
        let text = extract_text(&bytes, mime_type);
        if text.is_empty() {
            warn!("no text extracted from {}", file.name);
            return Ok(0);
        }

        let upsert = self
            .metadata
            .upsert_document(NewDocument {
                workspace_id,
                data_source_id: Some(data_source_id),
                external_id: file.id.clone(),
                title: file.name.clone(),
                content: text.clone(),
                metadata: json!({
                    "path": file.path,
                    "size": file.size,
                    "modifiedAt": file.modified_at,
                }),
            })
            .await?;

        if upsert.replaced {
            self.vectors.delete_chunks(upsert.document.id).await?;
        }

        let chunks = chunk_text(&text, self.config.chunk_size);
        let embeddings = self.embed_all(&chunks).await?;

        let records: Vec<ChunkRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(index, (content, embedding))| ChunkRecord {
                document_id: upsert.document.id,
                content,
                embedding: Some(embedding),
                index: index as u32,
                metadata: json!({
                    "documentId": upsert.document.id,
                    "index": index,
                    "source": file.name,
                }),
            })
            .collect();

        let chunk_count = records.len() as u32;
        self.vectors.add_chunks(&records).await?;

        info!("ingested {}: {chunk_count} chunks", file.name);
        Ok(chunk_count)
    }

    /// Ingest up to `max_files` plain files from a data source's listing.
    ///
    /// A failing file is logged and counted, and the batch continues with
    /// the remaining files.
    pub async fn ingest_data_source(
        &self,
        workspace_id: Uuid,
        data_source_id: Uuid,
    ) -> Result<IngestReport> {
        let data_source = self
            .metadata
            .data_source(data_source_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("data source {data_source_id}")))?;

        let connector = self
            .connectors
            .get(&data_source.kind)
            .ok_or_else(|| Error::NotFound(format!("connector kind {}", data_source.kind)))?;

        let files = connector.list_files(&data_source.config, None).await?;

        let mut report = IngestReport::default();
        for file in files
            .iter()
            .filter(|f| f.kind == FileKind::File)
            .take(self.config.max_files)
        {
            match self.ingest_document(workspace_id, data_source_id, file).await {
                Ok(chunks) => {
                    report.ingested += 1;
                    report.chunks += chunks;
                }
                Err(e) => {
                    warn!("failed to ingest {}: {e}", file.name);
                    report.failed += 1;
                }
            }
        }

        info!(
            "batch for data source {data_source_id}: {} ingested, {} failed",
            report.ingested, report.failed
        );
        Ok(report)
    }

    /// Embed every chunk with bounded concurrency, preserving chunk order.
    /// The first failure cancels the remaining calls and aborts the file.
    async fn embed_all(&self, chunks: &[String]) -> Result<Vec<Vec<f32>>> {
        let semaphore = Arc::new(Semaphore::new(self.config.embed_concurrency.max(1)));

        let futures = chunks.iter().map(|chunk| {
            let semaphore = Arc::clone(&semaphore);
            let embedder = Arc::clone(&self.embedder);
            let text = chunk.clone();
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| ProviderError::Stream(format!("semaphore error: {e}")))?;
                embedder.embed_text(&text, None).await
            }
        });

        try_join_all(futures).await.map_err(Error::Provider)
    }
}
