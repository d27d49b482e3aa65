//! # ragspace-core
//!
//! Core types and traits for ragspace, a workspace-scoped
//! retrieval-augmented-generation service.
//!
//! This crate provides the foundational abstractions used throughout the
//! service:
//!
//! - **Connectors**: [`Connector`] trait for listing and reading files from
//!   external data sources
//! - **Providers**: [`AiProvider`] trait for streaming chat completion and
//!   text embeddings
//! - **Vector storage**: [`VectorStore`] trait for chunk persistence and
//!   workspace-scoped similarity search
//! - **Metadata storage**: [`MetadataStore`] trait for workspace, document,
//!   data-source, and template records
//!
//! ## Architecture
//!
//! Ingestion runs the pipeline:
//!
//! ```text
//! DataSource → Connector → extract_text → chunk_text → AiProvider::embed_text → VectorStore
//! ```
//!
//! and querying runs:
//!
//! ```text
//! AiProvider::embed_text → VectorStore::similarity_search → prompt assembly → AiProvider::stream
//! ```
//!
//! All retrieval is scoped to one [`Workspace`]; chunks never cross that
//! boundary.
//!
//! ## Related Crates
//!
//! - `ragspace-connect`: filesystem connector and connector registry
//! - `ragspace-extract`: MIME-driven text extraction
//! - `ragspace-chunker`: fixed-size chunking
//! - `ragspace-providers`: Gemini/OpenAI/Ollama providers and registry
//! - `ragspace-store`: SQLite and in-memory stores
//! - `ragspace-ingest`: ingestion pipeline
//! - `ragspace-rag`: retriever, model router, RAG engine
//! - `ragspace-server`: HTTP/SSE layer

pub mod error;
pub mod traits;
pub mod types;

pub use error::{ConnectError, Error, ProviderError, Result, StoreError};
pub use traits::*;
pub use types::*;
