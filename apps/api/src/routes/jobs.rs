//! Axum route handlers for the Jobs API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::ApplicationRow;
use crate::models::job::JobRow;
use crate::ranking::rerank::rerank_job;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJobRequest {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct JobDetailResponse {
    pub job: JobRow,
    /// Ranked: best match first, newest first on ties.
    pub applications: Vec<ApplicationRow>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    validate_job_fields(&request.title, &request.description)?;

    let job = state
        .store
        .create_job(request.title.trim(), request.description.trim())
        .await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<JobRow>>, AppError> {
    Ok(Json(state.store.jobs().await?))
}

/// GET /api/v1/jobs/:id
///
/// The job plus its applications in ranked order.
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobDetailResponse>, AppError> {
    let job = state.store.job(id).await?.ok_or_else(|| job_not_found(id))?;
    let applications = state.store.applications_for_job(id).await?;
    Ok(Json(JobDetailResponse { job, applications }))
}

/// PUT /api/v1/jobs/:id
///
/// A changed description invalidates every match score for the job, so the
/// update reranks synchronously before responding. Title-only edits do not.
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateJobRequest>,
) -> Result<Json<JobRow>, AppError> {
    validate_job_fields(&request.title, &request.description)?;

    let existing = state.store.job(id).await?.ok_or_else(|| job_not_found(id))?;
    let updated = state
        .store
        .update_job(id, request.title.trim(), request.description.trim())
        .await?
        .ok_or_else(|| job_not_found(id))?;

    if existing.description != updated.description {
        rerank_job(state.store.as_ref(), state.scorer.as_ref(), &updated).await?;
    }
    Ok(Json(updated))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.store.delete_job(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(job_not_found(id))
    }
}

fn validate_job_fields(title: &str, description: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    if description.trim().is_empty() {
        return Err(AppError::Validation(
            "description cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn job_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("job {id} not found"))
}
