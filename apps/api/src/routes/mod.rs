pub mod admin;
pub mod applications;
pub mod health;
pub mod jobs;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Resumes can reach 10 MiB; leave headroom for multipart framing.
const MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs API
        .route(
            "/api/v1/jobs",
            post(jobs::handle_create_job).get(jobs::handle_list_jobs),
        )
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job)
                .put(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        // Applications API
        .route(
            "/api/v1/jobs/:id/applications",
            post(applications::handle_submit_application),
        )
        .route(
            "/api/v1/applications/:id",
            get(applications::handle_get_application)
                .patch(applications::handle_update_application),
        )
        // Admin API
        .route("/api/v1/admin/rerank", post(admin::handle_rerank))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
