//! # ragspace-server
//!
//! HTTP layer for ragspace, built on axum.
//!
//! ## Endpoints
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | POST | `/api/query` | RAG query, answered as an SSE stream |
//! | POST | `/api/workspaces` | create a workspace |
//! | GET | `/api/workspaces/{id}` | fetch a workspace |
//! | POST | `/api/workspaces/{id}/data-sources` | create a data source |
//! | GET | `/api/workspaces/{id}/data-sources` | list data sources |
//! | POST | `/api/workspaces/{id}/ingest` | synchronously ingest a capped batch |
//!
//! ## SSE contract
//!
//! The query stream carries three event types, in order: `citations` (JSON
//! array, once), `token` (JSON-encoded string fragment, repeated), `done`
//! (`[DONE]`). A provider failure mid-stream aborts the connection without
//! a `done` sentinel.
//!
//! Query requests are rate limited per client IP (`x-forwarded-for`, else
//! `unknown`) by an in-memory fixed-window [`RateLimiter`].

pub mod ratelimit;
pub mod routes;
pub mod state;

pub use ratelimit::RateLimiter;
pub use routes::router;
pub use state::AppState;
