//! Administrative route handlers.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::ranking::rerank::{rerank_all, RerankSummary};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RerankRequest {
    pub job_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct RerankResponse {
    pub jobs_reranked: usize,
    pub summaries: Vec<RerankSummary>,
}

/// POST /api/v1/admin/rerank
///
/// Recomputes match scores for one job (`{"job_id": ...}`) or for every job
/// when the body is empty. Runs synchronously; the response carries per-job
/// rescore counts.
pub async fn handle_rerank(
    State(state): State<AppState>,
    body: Option<Json<RerankRequest>>,
) -> Result<Json<RerankResponse>, AppError> {
    let job_id = body.and_then(|Json(request)| request.job_id);
    let summaries = rerank_all(state.store.as_ref(), state.scorer.as_ref(), job_id).await?;
    Ok(Json(RerankResponse {
        jobs_reranked: summaries.len(),
        summaries,
    }))
}
