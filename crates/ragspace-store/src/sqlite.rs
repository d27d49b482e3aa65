//! SQLite-backed store.
//!
//! Embeddings are stored as little-endian `f32` BLOBs. All database work
//! runs on the blocking pool; the connection is shared behind a mutex.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ragspace_core::{
    cosine_similarity, embedding_from_bytes, embedding_to_bytes, ChunkRecord, DataSource,
    Document, DocumentUpsert, MetadataStore, NewDocument, NewTemplate, ScoredChunk, StoreError,
    Template, VectorStore, Workspace,
};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// Persistent implementation of [`MetadataStore`] and [`VectorStore`] on
/// SQLite.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (and initialize) a database file, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Init(format!("create {}: {e}", parent.display())))?;
        }

        let conn = Connection::open(path)
            .map_err(|e| StoreError::Init(format!("open {}: {e}", path.display())))?;
        Self::init_schema(&conn)?;

        debug!("opened sqlite store at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database, for tests and throwaway runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Init(format!("open in-memory: {e}")))?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS workspaces (
                id           TEXT PRIMARY KEY,
                name         TEXT NOT NULL,
                model_config TEXT,
                created_at   TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS data_sources (
                id           TEXT PRIMARY KEY,
                workspace_id TEXT NOT NULL,
                name         TEXT NOT NULL,
                kind         TEXT NOT NULL,
                config       TEXT NOT NULL,
                created_at   TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS documents (
                id             TEXT PRIMARY KEY,
                workspace_id   TEXT NOT NULL,
                data_source_id TEXT,
                external_id    TEXT NOT NULL,
                title          TEXT NOT NULL,
                content        TEXT NOT NULL,
                metadata       TEXT NOT NULL,
                created_at     TEXT NOT NULL,
                updated_at     TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_documents_identity
                ON documents(workspace_id, ifnull(data_source_id, ''), external_id);

            CREATE TABLE IF NOT EXISTS document_chunks (
                id          TEXT PRIMARY KEY,
                document_id TEXT NOT NULL,
                content     TEXT NOT NULL,
                embedding   BLOB,
                idx         INTEGER NOT NULL,
                metadata    TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_document
                ON document_chunks(document_id);

            CREATE TABLE IF NOT EXISTS templates (
                id           TEXT PRIMARY KEY,
                workspace_id TEXT NOT NULL,
                name         TEXT NOT NULL,
                prompt       TEXT NOT NULL,
                kind         TEXT NOT NULL,
                config       TEXT NOT NULL,
                created_at   TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| StoreError::Init(format!("create schema: {e}")))
    }

    /// Run a closure against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, op: &'static str, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Query("connection lock poisoned".to_string()))?;
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Query(format!("{op}: blocking task failed: {e}")))?
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(s).map_err(|e| StoreError::Serialize(format!("bad uuid {s}: {e}")))
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Serialize(format!("bad timestamp {s}: {e}")))
}

fn parse_json(s: &str) -> Result<Value, StoreError> {
    serde_json::from_str(s).map_err(|e| StoreError::Serialize(format!("bad json: {e}")))
}

type DocumentRow = (
    String,
    String,
    Option<String>,
    String,
    String,
    String,
    String,
    String,
    String,
);

fn document_from_row(row: DocumentRow) -> Result<Document, StoreError> {
    let (id, workspace_id, data_source_id, external_id, title, content, metadata, created, updated) =
        row;
    Ok(Document {
        id: parse_uuid(&id)?,
        workspace_id: parse_uuid(&workspace_id)?,
        data_source_id: data_source_id.as_deref().map(parse_uuid).transpose()?,
        external_id,
        title,
        content,
        metadata: parse_json(&metadata)?,
        created_at: parse_time(&created)?,
        updated_at: parse_time(&updated)?,
    })
}

#[async_trait]
impl MetadataStore for SqliteStore {
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

        let record = workspace.clone();
        self.with_conn("create_workspace", move |conn| {
            conn.execute(
                "INSERT INTO workspaces (id, name, model_config, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.id.to_string(),
                    record.name,
                    record
                        .model_config
                        .as_ref()
                        .map(|c| c.to_string()),
                    record.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| StoreError::Insert(format!("workspace: {e}")))?;
            Ok(())
        })
        .await?;

        Ok(workspace)
    }

    async fn workspace(&self, id: Uuid) -> Result<Option<Workspace>, StoreError> {
        self.with_conn("workspace", move |conn| {
            let row: Option<(String, String, Option<String>, String)> = conn
                .query_row(
                    "SELECT id, name, model_config, created_at FROM workspaces WHERE id = ?1",
                    params![id.to_string()],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                )
                .optional()
                .map_err(|e| StoreError::Query(format!("workspace: {e}")))?;

            row.map(|(id, name, model_config, created_at)| {
                Ok(Workspace {
                    id: parse_uuid(&id)?,
                    name,
                    model_config: model_config.as_deref().map(parse_json).transpose()?,
                    created_at: parse_time(&created_at)?,
                })
            })
            .transpose()
        })
        .await
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

        let record = data_source.clone();
        self.with_conn("create_data_source", move |conn| {
            conn.execute(
                "INSERT INTO data_sources (id, workspace_id, name, kind, config, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id.to_string(),
                    record.workspace_id.to_string(),
                    record.name,
                    record.kind,
                    record.config.to_string(),
                    record.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| StoreError::Insert(format!("data_source: {e}")))?;
            Ok(())
        })
        .await?;

        Ok(data_source)
    }

    async fn data_source(&self, id: Uuid) -> Result<Option<DataSource>, StoreError> {
        self.with_conn("data_source", move |conn| {
            let row: Option<(String, String, String, String, String, String)> = conn
                .query_row(
                    "SELECT id, workspace_id, name, kind, config, created_at
                     FROM data_sources WHERE id = ?1",
                    params![id.to_string()],
                    |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                            row.get(5)?,
                        ))
                    },
                )
                .optional()
                .map_err(|e| StoreError::Query(format!("data_source: {e}")))?;

            row.map(|(id, workspace_id, name, kind, config, created_at)| {
                Ok(DataSource {
                    id: parse_uuid(&id)?,
                    workspace_id: parse_uuid(&workspace_id)?,
                    name,
                    kind,
                    config: parse_json(&config)?,
                    created_at: parse_time(&created_at)?,
                })
            })
            .transpose()
        })
        .await
    }

    async fn data_sources(&self, workspace_id: Uuid) -> Result<Vec<DataSource>, StoreError> {
        self.with_conn("data_sources", move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, workspace_id, name, kind, config, created_at
                     FROM data_sources WHERE workspace_id = ?1
                     ORDER BY created_at DESC",
                )
                .map_err(|e| StoreError::Query(format!("data_sources: {e}")))?;

            let rows: Vec<(String, String, String, String, String, String)> = stmt
                .query_map(params![workspace_id.to_string()], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                })
                .map_err(|e| StoreError::Query(format!("data_sources: {e}")))?
                .collect::<rusqlite::Result<_>>()
                .map_err(|e| StoreError::Query(format!("data_sources: {e}")))?;

            rows.into_iter()
                .map(|(id, workspace_id, name, kind, config, created_at)| {
                    Ok(DataSource {
                        id: parse_uuid(&id)?,
                        workspace_id: parse_uuid(&workspace_id)?,
                        name,
                        kind,
                        config: parse_json(&config)?,
                        created_at: parse_time(&created_at)?,
                    })
                })
                .collect()
        })
        .await
    }

    async fn upsert_document(&self, new: NewDocument) -> Result<DocumentUpsert, StoreError> {
        self.with_conn("upsert_document", move |conn| {
            let existing: Option<(String, String)> = conn
                .query_row(
                    "SELECT id, created_at FROM documents
                     WHERE workspace_id = ?1 AND data_source_id IS ?2 AND external_id = ?3",
                    params![
                        new.workspace_id.to_string(),
                        new.data_source_id.map(|id| id.to_string()),
                        new.external_id,
                    ],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .map_err(|e| StoreError::Query(format!("document lookup: {e}")))?;

            let now = Utc::now();

            if let Some((id, created_at)) = existing {
                conn.execute(
                    "UPDATE documents SET title = ?1, content = ?2, metadata = ?3, updated_at = ?4
                     WHERE id = ?5",
                    params![
                        new.title,
                        new.content,
                        new.metadata.to_string(),
                        now.to_rfc3339(),
                        id,
                    ],
                )
                .map_err(|e| StoreError::Insert(format!("document update: {e}")))?;

                return Ok(DocumentUpsert {
                    document: Document {
                        id: parse_uuid(&id)?,
                        workspace_id: new.workspace_id,
                        data_source_id: new.data_source_id,
                        external_id: new.external_id,
                        title: new.title,
                        content: new.content,
                        metadata: new.metadata,
                        created_at: parse_time(&created_at)?,
                        updated_at: now,
                    },
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

            conn.execute(
                "INSERT INTO documents
                     (id, workspace_id, data_source_id, external_id, title, content, metadata,
                      created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    document.id.to_string(),
                    document.workspace_id.to_string(),
                    document.data_source_id.map(|id| id.to_string()),
                    document.external_id,
                    document.title,
                    document.content,
                    document.metadata.to_string(),
                    document.created_at.to_rfc3339(),
                    document.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| StoreError::Insert(format!("document insert: {e}")))?;

            Ok(DocumentUpsert {
                document,
                replaced: false,
            })
        })
        .await
    }

    async fn document(&self, id: Uuid) -> Result<Option<Document>, StoreError> {
        self.with_conn("document", move |conn| {
            let row: Option<DocumentRow> = conn
                .query_row(
                    "SELECT id, workspace_id, data_source_id, external_id, title, content,
                            metadata, created_at, updated_at
                     FROM documents WHERE id = ?1",
                    params![id.to_string()],
                    |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                            row.get(5)?,
                            row.get(6)?,
                            row.get(7)?,
                            row.get(8)?,
                        ))
                    },
                )
                .optional()
                .map_err(|e| StoreError::Query(format!("document: {e}")))?;

            row.map(document_from_row).transpose()
        })
        .await
    }

    async fn documents_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Document>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let id_strings: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        self.with_conn("documents_by_ids", move |conn| {
            let placeholders = vec!["?"; id_strings.len()].join(", ");
            let sql = format!(
                "SELECT id, workspace_id, data_source_id, external_id, title, content,
                        metadata, created_at, updated_at
                 FROM documents WHERE id IN ({placeholders})"
            );

            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| StoreError::Query(format!("documents_by_ids: {e}")))?;

            let rows: Vec<DocumentRow> = stmt
                .query_map(rusqlite::params_from_iter(id_strings.iter()), |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                        row.get(7)?,
                        row.get(8)?,
                    ))
                })
                .map_err(|e| StoreError::Query(format!("documents_by_ids: {e}")))?
                .collect::<rusqlite::Result<_>>()
                .map_err(|e| StoreError::Query(format!("documents_by_ids: {e}")))?;

            rows.into_iter().map(document_from_row).collect()
        })
        .await
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

        let record = template.clone();
        self.with_conn("create_template", move |conn| {
            conn.execute(
                "INSERT INTO templates (id, workspace_id, name, prompt, kind, config, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id.to_string(),
                    record.workspace_id.to_string(),
                    record.name,
                    record.prompt,
                    record.kind,
                    record.config.to_string(),
                    record.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| StoreError::Insert(format!("template: {e}")))?;
            Ok(())
        })
        .await?;

        Ok(template)
    }

    async fn template(&self, id: Uuid) -> Result<Option<Template>, StoreError> {
        self.with_conn("template", move |conn| {
            let row: Option<(String, String, String, String, String, String, String)> = conn
                .query_row(
                    "SELECT id, workspace_id, name, prompt, kind, config, created_at
                     FROM templates WHERE id = ?1",
                    params![id.to_string()],
                    |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                            row.get(5)?,
                            row.get(6)?,
                        ))
                    },
                )
                .optional()
                .map_err(|e| StoreError::Query(format!("template: {e}")))?;

            row.map(|(id, workspace_id, name, prompt, kind, config, created_at)| {
                Ok(Template {
                    id: parse_uuid(&id)?,
                    workspace_id: parse_uuid(&workspace_id)?,
                    name,
                    prompt,
                    kind,
                    config: parse_json(&config)?,
                    created_at: parse_time(&created_at)?,
                })
            })
            .transpose()
        })
        .await
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn add_chunks(&self, chunks: &[ChunkRecord]) -> Result<(), StoreError> {
        let chunks = chunks.to_vec();
        self.with_conn("add_chunks", move |conn| {
            for record in &chunks {
                conn.execute(
                    "INSERT INTO document_chunks (id, document_id, content, embedding, idx, metadata)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        Uuid::new_v4().to_string(),
                        record.document_id.to_string(),
                        record.content,
                        record.embedding.as_deref().map(embedding_to_bytes),
                        record.index,
                        record.metadata.to_string(),
                    ],
                )
                .map_err(|e| StoreError::Insert(format!("chunk: {e}")))?;
            }
            debug!("added {} chunks", chunks.len());
            Ok(())
        })
        .await
    }

    async fn delete_chunks(&self, document_id: Uuid) -> Result<u64, StoreError> {
        self.with_conn("delete_chunks", move |conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM document_chunks WHERE document_id = ?1",
                    params![document_id.to_string()],
                )
                .map_err(|e| StoreError::Delete(format!("chunks: {e}")))?;
            Ok(deleted as u64)
        })
        .await
    }

    async fn similarity_search(
        &self,
        query: &[f32],
        limit: usize,
        workspace_id: Uuid,
    ) -> Result<Vec<ScoredChunk>, StoreError> {
        let query = query.to_vec();
        self.with_conn("similarity_search", move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT c.id, c.content, c.metadata, c.embedding
                     FROM document_chunks c
                     JOIN documents d ON d.id = c.document_id
                     WHERE d.workspace_id = ?1",
                )
                .map_err(|e| StoreError::Query(format!("similarity_search: {e}")))?;

            let rows: Vec<(String, String, String, Option<Vec<u8>>)> = stmt
                .query_map(params![workspace_id.to_string()], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                })
                .map_err(|e| StoreError::Query(format!("similarity_search: {e}")))?
                .collect::<rusqlite::Result<_>>()
                .map_err(|e| StoreError::Query(format!("similarity_search: {e}")))?;

            let mut results: Vec<ScoredChunk> = rows
                .into_iter()
                .map(|(id, content, metadata, embedding)| {
                    let score = embedding
                        .as_deref()
                        .and_then(embedding_from_bytes)
                        .map_or(-1.0, |e| cosine_similarity(&query, &e));
                    Ok(ScoredChunk {
                        id: parse_uuid(&id)?,
                        content,
                        metadata: parse_json(&metadata)?,
                        score,
                    })
                })
                .collect::<Result<_, StoreError>>()?;

            results.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            results.truncate(limit);
            Ok(results)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    async fn seeded_store() -> (SqliteStore, Workspace, Document) {
        let store = SqliteStore::open_in_memory().unwrap();
        let ws = store.create_workspace("acme", None).await.unwrap();
        let doc = store
            .upsert_document(NewDocument {
                workspace_id: ws.id,
                data_source_id: None,
                external_id: "/data/notes.txt".to_string(),
                title: "notes.txt".to_string(),
                content: "v1".to_string(),
                metadata: json!({"path": "/data/notes.txt"}),
            })
            .await
            .unwrap()
            .document;
        (store, ws, doc)
    }

    #[tokio::test]
    async fn test_open_creates_file_and_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sub").join("ragspace.db");

        let store = SqliteStore::open(&path).unwrap();
        assert!(path.exists());

        let ws = store.create_workspace("w", None).await.unwrap();
        assert!(store.workspace(ws.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_workspace_model_config_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let config = json!({"model": {"providerId": "openai", "modelId": "gpt-4o"}});

        let ws = store
            .create_workspace("acme", Some(config.clone()))
            .await
            .unwrap();
        let fetched = store.workspace(ws.id).await.unwrap().unwrap();

        assert_eq!(fetched.model_config, Some(config));
    }

    #[tokio::test]
    async fn test_upsert_document_replaces() {
        let (store, ws, doc) = seeded_store().await;

        let second = store
            .upsert_document(NewDocument {
                workspace_id: ws.id,
                data_source_id: None,
                external_id: "/data/notes.txt".to_string(),
                title: "notes.txt".to_string(),
                content: "v2".to_string(),
                metadata: json!({}),
            })
            .await
            .unwrap();

        assert!(second.replaced);
        assert_eq!(second.document.id, doc.id);

        let fetched = store.document(doc.id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "v2");
    }

    #[tokio::test]
    async fn test_chunks_round_trip_with_embedding_blob() {
        let (store, ws, doc) = seeded_store().await;

        store
            .add_chunks(&[
                ChunkRecord {
                    document_id: doc.id,
                    content: "alpha".to_string(),
                    embedding: Some(vec![1.0, 0.0]),
                    index: 0,
                    metadata: json!({"documentId": doc.id}),
                },
                ChunkRecord {
                    document_id: doc.id,
                    content: "beta".to_string(),
                    embedding: Some(vec![0.0, 1.0]),
                    index: 1,
                    metadata: json!({"documentId": doc.id}),
                },
            ])
            .await
            .unwrap();

        let results = store
            .similarity_search(&[1.0, 0.0], 5, ws.id)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "alpha");
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_delete_chunks_counts() {
        let (store, _ws, doc) = seeded_store().await;

        store
            .add_chunks(&[ChunkRecord {
                document_id: doc.id,
                content: "x".to_string(),
                embedding: None,
                index: 0,
                metadata: json!({}),
            }])
            .await
            .unwrap();

        assert_eq!(store.delete_chunks(doc.id).await.unwrap(), 1);
        assert_eq!(store.delete_chunks(doc.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_scoped_to_workspace() {
        let (store, ws, doc) = seeded_store().await;
        let other_ws = store.create_workspace("other", None).await.unwrap();
        let other_doc = store
            .upsert_document(NewDocument {
                workspace_id: other_ws.id,
                data_source_id: None,
                external_id: "/data/other.txt".to_string(),
                title: "other.txt".to_string(),
                content: "other".to_string(),
                metadata: json!({}),
            })
            .await
            .unwrap()
            .document;

        store
            .add_chunks(&[
                ChunkRecord {
                    document_id: doc.id,
                    content: "mine".to_string(),
                    embedding: Some(vec![1.0]),
                    index: 0,
                    metadata: json!({}),
                },
                ChunkRecord {
                    document_id: other_doc.id,
                    content: "theirs".to_string(),
                    embedding: Some(vec![1.0]),
                    index: 0,
                    metadata: json!({}),
                },
            ])
            .await
            .unwrap();

        let results = store.similarity_search(&[1.0], 10, ws.id).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "mine");
    }

    #[tokio::test]
    async fn test_missing_embedding_sentinel() {
        let (store, ws, doc) = seeded_store().await;

        store
            .add_chunks(&[ChunkRecord {
                document_id: doc.id,
                content: "no vector".to_string(),
                embedding: None,
                index: 0,
                metadata: json!({}),
            }])
            .await
            .unwrap();

        let results = store
            .similarity_search(&[0.5, 0.5], 5, ws.id)
            .await
            .unwrap();
        assert_eq!(results[0].score, -1.0);
    }

    #[tokio::test]
    async fn test_documents_by_ids_empty_and_missing() {
        let (store, _ws, doc) = seeded_store().await;

        assert!(store.documents_by_ids(&[]).await.unwrap().is_empty());

        let found = store
            .documents_by_ids(&[doc.id, Uuid::new_v4()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_template_round_trip() {
        let (store, ws, _doc) = seeded_store().await;

        let template = store
            .create_template(NewTemplate {
                workspace_id: ws.id,
                name: "support".to_string(),
                prompt: "Answer briefly.".to_string(),
                kind: "chat".to_string(),
                config: json!({"model": {"providerId": "gemini", "modelId": "gemini-pro"}}),
            })
            .await
            .unwrap();

        let fetched = store.template(template.id).await.unwrap().unwrap();
        assert_eq!(fetched.prompt, "Answer briefly.");
        assert_eq!(
            fetched.config["model"]["providerId"],
            json!("gemini")
        );
        assert!(store.template(Uuid::new_v4()).await.unwrap().is_none());
    }
}
