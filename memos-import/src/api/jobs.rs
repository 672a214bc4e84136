//! Job endpoints
//!
//! Starting a job checks, in order: the single active slot (409), the saved
//! session (400), the job kind (404) and the job input (400). Admission is then
//! repeated atomically in the registry, so a racing start still gets 409.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

use super::{events::job_event_stream, parse_json_body};
use crate::engine::{build_engine, ArtifactStore};
use crate::error::{ApiError, ApiResult};
use crate::models::{JobId, JobKind, JobSnapshot, JobStatus, UploadHandle, UploadKind};
use crate::services::Job;
use crate::AppState;

/// Body of `POST /api/jobs/:kind`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartJobRequest {
    #[serde(default)]
    pub upload_id: Option<String>,
    /// Local file path; `htmlPath` and `txtPath` are accepted as aliases
    #[serde(default, alias = "htmlPath", alias = "txtPath")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartJobResponse {
    pub job_id: JobId,
    pub status: JobStatus,
}

/// Where a job reads its input from
enum JobInput {
    Upload(UploadHandle, UploadKind),
    Path(PathBuf),
    None,
}

/// POST /api/jobs/:kind
pub async fn start_job(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<StartJobResponse>)> {
    if let Some(active) = state.registry.active_job() {
        return Err(ApiError::job_conflict(active));
    }

    let session = state
        .session
        .read()
        .await
        .clone()
        .ok_or_else(|| ApiError::BadRequest("Save a session via /api/session first".to_string()))?;

    let kind: JobKind = kind
        .parse()
        .map_err(|e: crate::models::UnknownKind| ApiError::NotFound(e.to_string()))?;

    let request: StartJobRequest = parse_json_body(&body)?;
    let input = resolve_input(&state, kind, &request).await?;

    let client = state.clients.connect(&session)?;

    let upload = match &input {
        JobInput::Upload(handle, _) => Some(*handle),
        _ => None,
    };
    let job = state.registry.admit(kind, upload)?;

    let entry = match input {
        JobInput::Upload(handle, upload_kind) => {
            match state.staging.claim(handle, upload_kind, job.id()) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    state.registry.discard(job.id());
                    return Err(e.into());
                }
            }
        }
        JobInput::Path(path) => Some(path),
        JobInput::None => None,
    };

    let artifacts = ArtifactStore::new(state.config.artifact_dir.clone());
    let engine = match build_engine(kind, entry, client, artifacts) {
        Ok(engine) => engine,
        Err(e) => {
            abandon(&state, &job).await;
            return Err(ApiError::BadRequest(e.to_string()));
        }
    };

    info!(job_id = %job.id(), kind = %kind, "Job accepted");
    state.runner.spawn(job.clone(), engine);

    Ok((
        StatusCode::ACCEPTED,
        Json(StartJobResponse {
            job_id: job.id(),
            status: JobStatus::Running,
        }),
    ))
}

/// GET /api/jobs/:id/result and GET /api/jobs/:id
pub async fn job_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobSnapshot>> {
    let job = lookup_job(&state, &id)?;
    Ok(Json(job.snapshot()))
}

pub(crate) fn lookup_job(state: &AppState, id: &str) -> ApiResult<std::sync::Arc<Job>> {
    Uuid::parse_str(id)
        .ok()
        .and_then(|id| state.registry.get(id))
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {}", id)))
}

async fn resolve_input(
    state: &AppState,
    kind: JobKind,
    request: &StartJobRequest,
) -> ApiResult<JobInput> {
    let Some(upload_kind) = kind.upload_kind() else {
        return Ok(JobInput::None);
    };

    if let Some(raw) = request.upload_id.as_deref().filter(|s| !s.trim().is_empty()) {
        let handle = Uuid::parse_str(raw.trim())
            .map_err(|_| ApiError::BadRequest(format!("uploadId invalid or expired: {}", raw)))?;
        let upload = state
            .staging
            .get(handle)
            .ok_or_else(|| ApiError::BadRequest(format!("uploadId invalid or expired: {}", raw)))?;
        if upload.kind != upload_kind {
            return Err(ApiError::BadRequest(format!(
                "Upload {} is a {} upload, expected {}",
                handle, upload.kind, upload_kind
            )));
        }
        return Ok(JobInput::Upload(handle, upload_kind));
    }

    if let Some(raw) = request.path.as_deref().filter(|s| !s.trim().is_empty()) {
        let path = PathBuf::from(raw.trim());
        let path = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()?.join(path)
        };
        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(ApiError::BadRequest(format!("File not found: {}", path.display())));
        }
        return Ok(JobInput::Path(path));
    }

    Err(ApiError::BadRequest(format!(
        "{} jobs require uploadId or path",
        kind
    )))
}

/// Roll back an admitted job that could not be started
async fn abandon(state: &AppState, job: &Job) {
    if let Some(handle) = job.upload() {
        state.staging.release(handle).await;
    }
    state.registry.discard(job.id());
}

pub fn job_routes() -> Router<AppState> {
    Router::new()
        // POST takes a job kind, GET a job id; one pattern serves both
        .route("/api/jobs/:id", post(start_job).get(job_result))
        .route("/api/jobs/:id/result", get(job_result))
        .route("/api/jobs/:id/events", get(job_event_stream))
}
