//! # ragspace-ingest
//!
//! Document ingestion for ragspace.
//!
//! [`IngestionPipeline`] runs one file through
//! Connector → Extractor → Chunker → Embedder → Vector Store, and
//! [`IngestionPipeline::ingest_data_source`] drives a capped batch over a
//! data source's listing.
//!
//! Chunk embeddings fan out with bounded concurrency (a semaphore sized by
//! [`IngestConfig::embed_concurrency`]) and are collected in order before a
//! single bulk insert. Failures are not retried: the first embedding error
//! cancels the remaining calls and aborts that file, leaving any committed
//! document upsert in place for a later re-ingest to repair.

pub mod pipeline;

pub use pipeline::{IngestConfig, IngestReport, IngestionPipeline};
