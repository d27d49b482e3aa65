//! # ragspace-rag
//!
//! Query-time orchestration for ragspace:
//!
//! - [`Retriever`]: embed the query, search the vector store, attach parent
//!   documents for citations
//! - [`ModelRouter`]: resolve provider/model/parameters for a workspace and
//!   optional template
//! - [`RagEngine`]: assemble the prompt with a `[Source: Title]` context
//!   block and stream the answer from the resolved provider
//!
//! A query produces exactly two outputs (see [`RagResponse`]): the token
//! stream and the citation list. Citations are fixed before the first token
//! is produced.

pub mod engine;
pub mod retriever;
pub mod router;

pub use engine::{RagEngine, RagResponse, DEFAULT_SYSTEM_PROMPT};
pub use retriever::{Retriever, DEFAULT_RETRIEVE_LIMIT};
pub use router::{ModelRouter, ResolvedModel};
