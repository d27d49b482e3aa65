//! HTTP routes and handlers.
//!
//! The query endpoint answers with a server-sent-event stream carrying
//! exactly three event types: `citations` (JSON array, once, before any
//! token), `token` (JSON-encoded string fragment, repeated), and `done`
//! (terminal sentinel). Everything else is plain JSON.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use ragspace_core::{ConnectError, Connector, Error, MetadataStore};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::{error, warn};
use uuid::Uuid;

use crate::state::AppState;

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/query", post(query))
        .route("/api/workspaces", post(create_workspace))
        .route("/api/workspaces/{id}", get(get_workspace))
        .route(
            "/api/workspaces/{id}/data-sources",
            post(create_data_source).get(list_data_sources),
        )
        .route("/api/workspaces/{id}/ingest", post(ingest))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Error mapping
// ============================================================================

/// Wraps [`Error`] with an HTTP status for the response.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Connect(ConnectError::AccessDenied(_)) => StatusCode::FORBIDDEN,
            Error::Connect(ConnectError::InvalidConfig(_)) => StatusCode::BAD_REQUEST,
            Error::Provider(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("request failed: {}", self.0);
        } else {
            warn!("request rejected ({status}): {}", self.0);
        }

        (status, Json(json!({"error": self.0.to_string()}))).into_response()
    }
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub workspace_id: Uuid,
    pub query: String,
    pub template_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub data_source_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CreateDataSourceRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub config: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkspaceRequest {
    pub name: String,
    pub model_config: Option<Value>,
}

// ============================================================================
// Handlers
// ============================================================================

/// `POST /api/query` - run the RAG engine and stream the answer as SSE.
async fn query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<QueryRequest>,
) -> Result<Response, ApiError> {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    if !state.limiter.check(&format!("query:{ip}")) {
        return Ok((
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"error": "rate limit exceeded"})),
        )
            .into_response());
    }

    let response = state
        .engine
        .query(body.workspace_id, &body.query, body.template_id)
        .await?;

    let citations_json =
        serde_json::to_string(&response.citations).map_err(Error::Serialization)?;
    let mut tokens = response.stream;

    let sse_stream = async_stream::stream! {
        // Citations go out once, before any token
        yield Ok::<Event, axum::Error>(Event::default().event("citations").data(citations_json));

        while let Some(item) = tokens.next().await {
            match item {
                Ok(token) => {
                    let data = match serde_json::to_string(&token) {
                        Ok(data) => data,
                        Err(e) => {
                            yield Err(axum::Error::new(e));
                            return;
                        }
                    };
                    yield Ok(Event::default().event("token").data(data));
                }
                Err(e) => {
                    // Mid-stream provider failure aborts the connection;
                    // no `done` sentinel is sent
                    error!("streaming error: {e}");
                    yield Err(axum::Error::new(e));
                    return;
                }
            }
        }

        yield Ok(Event::default().event("done").data("[DONE]"));
    };

    Ok(Sse::new(sse_stream)
        .keep_alive(KeepAlive::default())
        .into_response())
}

/// `POST /api/workspaces/{id}/ingest` - synchronously ingest a capped batch
/// of files from one data source.
async fn ingest(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    Json(body): Json<IngestRequest>,
) -> Result<Json<Value>, ApiError> {
    let data_source = state
        .metadata
        .data_source(body.data_source_id)
        .await
        .map_err(Error::from)?
        .filter(|ds| ds.workspace_id == workspace_id)
        .ok_or_else(|| Error::NotFound(format!("data source {}", body.data_source_id)))?;

    let report = state
        .pipeline
        .ingest_data_source(workspace_id, data_source.id)
        .await?;

    Ok(Json(json!({
        "message": format!("Ingested {} documents", report.ingested),
        "ingested": report.ingested,
        "failed": report.failed,
        "chunks": report.chunks,
    })))
}

/// `POST /api/workspaces/{id}/data-sources` - create after validating the
/// connector kind and config.
async fn create_data_source(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    Json(body): Json<CreateDataSourceRequest>,
) -> Result<Json<Value>, ApiError> {
    let workspace = state
        .metadata
        .workspace(workspace_id)
        .await
        .map_err(Error::from)?
        .ok_or_else(|| Error::NotFound(format!("workspace {workspace_id}")))?;

    let connector = state.connectors.get(&body.kind).ok_or_else(|| {
        Error::Connect(ConnectError::InvalidConfig(format!(
            "unknown connector type {}",
            body.kind
        )))
    })?;

    let valid = connector
        .validate_config(&body.config)
        .await
        .map_err(Error::from)?;
    if !valid {
        return Err(Error::Connect(ConnectError::InvalidConfig(format!(
            "config rejected by {} connector",
            body.kind
        )))
        .into());
    }

    let data_source = state
        .metadata
        .create_data_source(workspace.id, &body.name, &body.kind, body.config)
        .await
        .map_err(Error::from)?;

    Ok(Json(serde_json::to_value(data_source).map_err(Error::Serialization)?))
}

/// `GET /api/workspaces/{id}/data-sources` - list, newest first.
async fn list_data_sources(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state
        .metadata
        .workspace(workspace_id)
        .await
        .map_err(Error::from)?
        .ok_or_else(|| Error::NotFound(format!("workspace {workspace_id}")))?;

    let sources = state
        .metadata
        .data_sources(workspace_id)
        .await
        .map_err(Error::from)?;

    Ok(Json(serde_json::to_value(sources).map_err(Error::Serialization)?))
}

/// `POST /api/workspaces` - create a workspace.
async fn create_workspace(
    State(state): State<AppState>,
    Json(body): Json<CreateWorkspaceRequest>,
) -> Result<Json<Value>, ApiError> {
    let workspace = state
        .metadata
        .create_workspace(&body.name, body.model_config)
        .await
        .map_err(Error::from)?;

    Ok(Json(serde_json::to_value(workspace).map_err(Error::Serialization)?))
}

/// `GET /api/workspaces/{id}`.
async fn get_workspace(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let workspace = state
        .metadata
        .workspace(workspace_id)
        .await
        .map_err(Error::from)?
        .ok_or_else(|| Error::NotFound(format!("workspace {workspace_id}")))?;

    Ok(Json(serde_json::to_value(workspace).map_err(Error::Serialization)?))
}
