//! Shared server state.

use ragspace_connect::ConnectorRegistry;
use ragspace_core::{MetadataStore, VectorStore};
use ragspace_ingest::IngestionPipeline;
use ragspace_rag::RagEngine;
use std::sync::Arc;

use crate::ratelimit::RateLimiter;

/// Everything the handlers need, wired once at startup.
#[derive(Clone)]
pub struct AppState {
    pub metadata: Arc<dyn MetadataStore>,
    pub vectors: Arc<dyn VectorStore>,
    pub connectors: Arc<ConnectorRegistry>,
    pub pipeline: Arc<IngestionPipeline>,
    pub engine: Arc<RagEngine>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        vectors: Arc<dyn VectorStore>,
        connectors: Arc<ConnectorRegistry>,
        pipeline: Arc<IngestionPipeline>,
        engine: Arc<RagEngine>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            metadata,
            vectors,
            connectors,
            pipeline,
            engine,
            limiter,
        }
    }
}
