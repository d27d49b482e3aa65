//! # ragspace-store
//!
//! Metadata and vector storage for ragspace.
//!
//! Two implementations of the [`MetadataStore`](ragspace_core::MetadataStore)
//! and [`VectorStore`](ragspace_core::VectorStore) traits:
//!
//! - [`SqliteStore`]: persistent, embeddings as little-endian `f32` BLOBs,
//!   database work on the blocking pool.
//! - [`MemoryStore`]: `RwLock`-guarded maps for tests and development.
//!
//! Similarity search is brute force: load every chunk in the workspace,
//! score with cosine similarity, sort, truncate. Correct but O(n) per
//! query, deliberately prototype-grade, with no vector index and no
//! caching. Chunks without a stored embedding score the `-1.0` sentinel so
//! they sort last instead of breaking the comparison.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
