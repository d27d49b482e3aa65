//! Core types for ragspace.
//!
//! This module contains the shared data structures used across the service:
//!
//! ## Workspace records
//! - [`Workspace`]: the tenant/isolation boundary
//! - [`DataSource`]: a connector-backed source of files
//! - [`Document`]: extracted text plus bookkeeping, upserted by identity
//! - [`DocumentChunk`]: an embedded slice of a document
//! - [`Template`]: a stored prompt with an optional model preset
//!
//! ## Connectors
//! - [`FileObject`]: a connector-native listing entry
//!
//! ## Retrieval
//! - [`ScoredChunk`]: a similarity-search hit
//! - [`ScoredDocument`]: a hit enriched with its parent document for citations
//!
//! ## Chat
//! - [`ChatMessage`], [`MessageRole`]: provider-neutral message shapes
//! - [`ModelPreset`], [`ModelRef`], [`ModelParameters`]: model selection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ============================================================================
// Workspace Records
// ============================================================================

/// The tenant boundary. Owns data sources, documents, and templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Unique workspace identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Optional default model configuration (a [`ModelPreset`] shape, or the
    /// legacy `{providerId, modelId}` shape)
    pub model_config: Option<Value>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// A connector-backed source of files within a workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    /// Unique data source identifier
    pub id: Uuid,
    /// Owning workspace
    pub workspace_id: Uuid,
    /// Display name
    pub name: String,
    /// Connector kind (e.g. `"filesystem"`)
    pub kind: String,
    /// Connector-specific configuration, opaque to the core
    pub config: Value,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// A document: extracted text plus bookkeeping.
///
/// Upserted by the identity `(workspace_id, data_source_id, external_id)`;
/// re-ingestion replaces `content` and clears prior chunks. Last write wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Unique document identifier
    pub id: Uuid,
    /// Owning workspace
    pub workspace_id: Uuid,
    /// Data source this document was ingested from, if any
    pub data_source_id: Option<Uuid>,
    /// Connector-native identifier (filesystem: absolute path)
    pub external_id: String,
    /// Display title (filesystem: file name)
    pub title: String,
    /// Full extracted text
    pub content: String,
    /// Free-form metadata
    pub metadata: Value,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Fields for a document upsert.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub workspace_id: Uuid,
    pub data_source_id: Option<Uuid>,
    pub external_id: String,
    pub title: String,
    pub content: String,
    pub metadata: Value,
}

/// Result of a document upsert.
#[derive(Debug, Clone)]
pub struct DocumentUpsert {
    /// The created or updated record
    pub document: Document,
    /// Whether an existing document was replaced (its chunks must be cleared)
    pub replaced: bool,
}

/// An embedded slice of a document.
///
/// `index` values are dense, zero-based, and document-local. Chunks are owned
/// exclusively by their document and never outlive it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentChunk {
    /// Unique chunk identifier
    pub id: Uuid,
    /// Parent document
    pub document_id: Uuid,
    /// Chunk text (a substring of the document content)
    pub content: String,
    /// Embedding as raw little-endian `f32` bytes, if computed
    pub embedding: Option<Vec<u8>>,
    /// Position within the document
    pub index: u32,
    /// Free-form metadata
    pub metadata: Value,
}

/// Insert shape for chunks: the embedding is still a float vector here and is
/// serialized to bytes by the store.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub document_id: Uuid,
    pub content: String,
    pub embedding: Option<Vec<f32>>,
    pub index: u32,
    pub metadata: Value,
}

/// A stored prompt with an optional model preset, read-only at query time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Unique template identifier
    pub id: Uuid,
    /// Owning workspace
    pub workspace_id: Uuid,
    /// Display name
    pub name: String,
    /// System prompt text
    pub prompt: String,
    /// Template type tag
    pub kind: String,
    /// Optional [`ModelPreset`] shape
    pub config: Value,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Fields for template creation.
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub workspace_id: Uuid,
    pub name: String,
    pub prompt: String,
    pub kind: String,
    pub config: Value,
}

// ============================================================================
// Connector Listings
// ============================================================================

/// Kind of a connector listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Folder,
}

/// A connector-native listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileObject {
    /// Connector-native identifier (filesystem: absolute path)
    pub id: String,
    /// Entry name
    pub name: String,
    /// Entry path as reported by the connector
    pub path: String,
    /// File or folder
    pub kind: FileKind,
    /// MIME type if the connector knows it
    pub mime_type: Option<String>,
    /// Size in bytes if known
    pub size: Option<u64>,
    /// Last modification time if known
    pub modified_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Retrieval
// ============================================================================

/// A similarity-search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredChunk {
    /// Chunk identifier
    pub id: Uuid,
    /// Chunk text
    pub content: String,
    /// Chunk metadata (carries `documentId` for enrichment)
    pub metadata: Value,
    /// Cosine similarity against the query vector; `-1.0` when the chunk has
    /// no stored embedding
    pub score: f32,
}

/// Parent-document fields attached to a hit for citation display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    pub title: String,
    pub external_id: Option<String>,
}

/// A hit enriched with its parent document.
///
/// `document` is `None` when the parent was deleted after chunking; retrieval
/// tolerates that rather than failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredDocument {
    pub id: Uuid,
    pub content: String,
    pub metadata: Value,
    pub score: f32,
    pub document: Option<DocumentRef>,
}

impl ScoredDocument {
    /// Attach a document reference to a search hit.
    pub fn from_chunk(chunk: ScoredChunk, document: Option<DocumentRef>) -> Self {
        Self {
            id: chunk.id,
            content: chunk.content,
            metadata: chunk.metadata,
            score: chunk.score,
            document,
        }
    }
}

// ============================================================================
// Chat
// ============================================================================

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A provider-neutral chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// A model offered by a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider_id: String,
}

/// Selects a provider and model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRef {
    pub provider_id: String,
    pub model_id: String,
}

/// Sampling parameters forwarded to the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
}

/// A full model selection: provider/model plus parameters and an optional
/// system-prompt override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPreset {
    pub model: ModelRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ModelParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl ModelPreset {
    /// The system default: Gemini, temperature 0.7.
    pub fn system_default() -> Self {
        Self {
            model: ModelRef {
                provider_id: "gemini".to_string(),
                model_id: "gemini-pro".to_string(),
            },
            parameters: Some(ModelParameters {
                temperature: Some(0.7),
                ..Default::default()
            }),
            system_prompt: None,
        }
    }

    /// Parse a stored JSON value if it carries a valid `model` shape.
    ///
    /// Returns `None` for values that do not look like a preset; malformed
    /// configs fall through to the next resolution step rather than failing.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() || value.get("model").is_none() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// Parse the legacy flat `{providerId, modelId}` shape, filling in the
    /// default parameters.
    pub fn from_legacy_value(value: &Value) -> Option<Self> {
        let provider_id = value.get("providerId")?.as_str()?;
        let model_id = value.get("modelId")?.as_str()?;
        Some(Self {
            model: ModelRef {
                provider_id: provider_id.to_string(),
                model_id: model_id.to_string(),
            },
            parameters: Self::system_default().parameters,
            system_prompt: None,
        })
    }
}

// ============================================================================
// Embedding Codec
// ============================================================================

/// Serialize an embedding as raw little-endian `f32` bytes.
#[must_use]
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Deserialize raw little-endian `f32` bytes back into an embedding.
///
/// Returns `None` when the byte length is not a multiple of four.
#[must_use]
pub fn embedding_from_bytes(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    )
}

/// Cosine similarity between two vectors.
///
/// Mismatched dimensions and zero-norm inputs score 0.0 rather than NaN, so
/// they stay distinguishable from the `-1.0` missing-embedding sentinel.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
