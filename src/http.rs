//! HTTP surface.
//!
//! Thin axum layer over the pipeline and the read surface. The webhook
//! handler reads the raw body so signature verification sees the exact
//! bytes that were signed; the pipeline itself runs on a blocking worker
//! thread.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::core::{ProjectId, Timestamp};
use crate::read::ReadSurface;
use crate::service::{ChangeService, IngestOutcome};
use crate::slack::events::decode_envelope;
use crate::slack::signature::{self, SIGNATURE_HEADER, TIMESTAMP_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ChangeService>,
    pub read: ReadSurface,
    pub signing_secret: Arc<str>,
}

impl AppState {
    pub fn new(service: Arc<ChangeService>, signing_secret: impl Into<Arc<str>>) -> Self {
        let read = ReadSurface::new(Arc::clone(service.store()));
        Self {
            service,
            read,
            signing_secret: signing_secret.into(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/bootstrap", post(bootstrap))
        .route("/slack/events", post(slack_events))
        .route("/read/status", get(read_status))
        .route("/read/graph/current", get(read_graph_current))
        .route("/read/graph/changes", get(read_graph_changes))
        .route("/read/projects/{project_id}", get(read_project))
        .route("/read/projects/{project_id}/checklist", get(read_checklist))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn read_status() -> Json<serde_json::Value> {
    Json(json!({ "message": "read route online" }))
}

async fn bootstrap(State(state): State<AppState>) -> Json<serde_json::Value> {
    let summary = state.service.bootstrap();
    Json(json!({
        "ok": true,
        "detail": format!(
            "seeded {} project(s), {} already present",
            summary.created, summary.existing
        ),
    }))
}

/// The webhook endpoint. Authentication precedes everything; a rejected
/// signature means no state change of any kind.
async fn slack_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let timestamp = match header(&headers, TIMESTAMP_HEADER) {
        Some(value) => value,
        None => return auth_error("missing timestamp header"),
    };
    let provided = match header(&headers, SIGNATURE_HEADER) {
        Some(value) => value,
        None => return auth_error("missing signature header"),
    };
    if let Err(err) = signature::verify(&state.signing_secret, &timestamp, &body, &provided) {
        return auth_error(&err.to_string());
    }

    let envelope = match decode_envelope(&body) {
        Ok(envelope) => envelope,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "detail": format!("undecodable envelope: {err}") })),
            )
                .into_response()
        }
    };

    let service = Arc::clone(&state.service);
    let outcome = tokio::task::spawn_blocking(move || service.handle_envelope(envelope)).await;
    match outcome {
        // Slack's handshake expects the bare challenge object.
        Ok(IngestOutcome::Challenge { challenge }) => {
            Json(json!({ "challenge": challenge })).into_response()
        }
        Ok(outcome) => Json(outcome).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "pipeline worker failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": "pipeline worker failed" })),
            )
                .into_response()
        }
    }
}

async fn read_graph_current(State(state): State<AppState>) -> Response {
    Json(state.read.current_truth()).into_response()
}

#[derive(Debug, Deserialize)]
struct ChangesQuery {
    since: String,
}

async fn read_graph_changes(
    State(state): State<AppState>,
    Query(query): Query<ChangesQuery>,
) -> Response {
    match Timestamp::parse(&query.since) {
        Ok(since) => Json(state.read.changes_since(since)).into_response(),
        Err(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Invalid 'since' parameter. Use RFC3339 format." })),
        )
            .into_response(),
    }
}

async fn read_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Response {
    match parse_project_id(&project_id).and_then(|id| state.read.project(&id)) {
        Some(project) => Json(project).into_response(),
        None => not_found("Project not found"),
    }
}

async fn read_checklist(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Response {
    match parse_project_id(&project_id).and_then(|id| state.read.checklist(&id)) {
        Some(checklist) => Json(checklist).into_response(),
        None => not_found("Project not found"),
    }
}

fn parse_project_id(raw: &str) -> Option<ProjectId> {
    ProjectId::new(raw).ok()
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn auth_error(detail: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": detail })),
    )
        .into_response()
}

fn not_found(detail: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": detail }))).into_response()
}
