//! Axum route handlers for the Applications API.

use anyhow::Context;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{ApplicationRow, ApplicationStatus, NewApplication};
use crate::state::AppState;

/// Upload cap, matching what reviewers are willing to open.
const MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 2] = ["pdf", "docx"];

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SubmitApplicationResponse {
    pub application_id: Uuid,
    pub task_id: Uuid,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateApplicationRequest {
    pub status: String,
    #[serde(default)]
    pub notes: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jobs/:id/applications
///
/// Multipart form: `candidate_name`, `candidate_email`, `resume` (file).
/// Accepts .pdf and .docx up to 10 MiB. The file is stored, the application
/// row is created unscored, and ingestion work is submitted. Responds 202
/// with the application and task ids; scores appear once the task finishes.
pub async fn handle_submit_application(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitApplicationResponse>), AppError> {
    let job = state
        .store
        .job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("job {job_id} not found")))?;

    let mut candidate_name = String::new();
    let mut candidate_email = String::new();
    let mut resume: Option<(String, axum::body::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "candidate_name" => {
                candidate_name = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("invalid candidate_name: {e}")))?
                    .trim()
                    .to_string();
            }
            "candidate_email" => {
                candidate_email = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("invalid candidate_email: {e}")))?
                    .trim()
                    .to_string();
            }
            "resume" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read resume: {e}")))?;
                resume = Some((file_name, data));
            }
            _ => {}
        }
    }

    if candidate_name.is_empty() {
        return Err(AppError::Validation("candidate_name is required".to_string()));
    }
    if candidate_email.is_empty() || !candidate_email.contains('@') {
        return Err(AppError::Validation(
            "candidate_email must be a valid email address".to_string(),
        ));
    }
    let Some((file_name, data)) = resume else {
        return Err(AppError::Validation("resume file is required".to_string()));
    };

    let extension = std::path::Path::new(&file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::Validation(
            "only PDF and DOCX resumes are accepted".to_string(),
        ));
    }
    if data.len() > MAX_RESUME_BYTES {
        return Err(AppError::Validation(
            "resume file must be 10 MiB or smaller".to_string(),
        ));
    }

    let relative_path = format!("resumes/{}.{extension}", Uuid::new_v4());
    let stored_path = state.config.upload_dir.join(&relative_path);
    if let Some(parent) = stored_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .context("failed to create upload directory")?;
    }
    tokio::fs::write(&stored_path, &data)
        .await
        .context("failed to store resume file")?;

    let application = state
        .store
        .create_application(NewApplication {
            job_id: job.id,
            candidate_name,
            candidate_email,
            resume_path: relative_path,
        })
        .await?;

    let handle = state.dispatcher.submit(application.id).await;
    info!(
        "accepted application {} for job {} ({})",
        application.id, job.id, job.title
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitApplicationResponse {
            application_id: application.id,
            task_id: handle.task_id(),
            status: "accepted".to_string(),
        }),
    ))
}

/// GET /api/v1/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationRow>, AppError> {
    let application = state
        .store
        .application(id)
        .await?
        .ok_or_else(|| application_not_found(id))?;
    Ok(Json(application))
}

/// PATCH /api/v1/applications/:id
///
/// Reviewer updates: status and notes only. Scores are owned by the ranking
/// pipeline and cannot be set here.
pub async fn handle_update_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateApplicationRequest>,
) -> Result<Json<ApplicationRow>, AppError> {
    let Some(status) = ApplicationStatus::parse(&request.status) else {
        return Err(AppError::Validation(format!(
            "invalid status {:?}, expected one of NEW, REVIEW, INTERVIEW, REJECTED, HIRED",
            request.status
        )));
    };

    let application = state
        .store
        .update_review(id, status, request.notes.trim())
        .await?
        .ok_or_else(|| application_not_found(id))?;
    Ok(Json(application))
}

fn application_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("application {id} not found"))
}
