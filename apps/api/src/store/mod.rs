//! Storage port for jobs and applications.
//!
//! Handlers and the ranking pipeline only ever talk to `ApplicationStore`.
//! Two backends implement it: `PgApplicationStore` (production, transactional
//! row-locking rerank) and `MemoryApplicationStore` (tests and single-process
//! deployments).

pub mod memory;
pub mod postgres;

pub use memory::MemoryApplicationStore;
pub use postgres::PgApplicationStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::application::{ApplicationRow, ApplicationStatus, NewApplication};
use crate::models::job::JobRow;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Per-row scoring callback for `rescore_applications`. Returns the new score
/// for the row, or `None` to leave it untouched.
///
/// Synchronous on purpose: backends invoke it while holding row locks inside
/// a transaction and must not yield mid-rescore.
pub type ScoreFn<'a> = &'a (dyn Fn(&ApplicationRow) -> Option<f64> + Send + Sync);

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn create_job(&self, title: &str, description: &str) -> Result<JobRow, StoreError>;

    async fn job(&self, id: Uuid) -> Result<Option<JobRow>, StoreError>;

    /// All jobs, newest first.
    async fn jobs(&self) -> Result<Vec<JobRow>, StoreError>;

    async fn update_job(
        &self,
        id: Uuid,
        title: &str,
        description: &str,
    ) -> Result<Option<JobRow>, StoreError>;

    /// Deletes a job and all of its applications. Returns whether it existed.
    async fn delete_job(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn create_application(&self, new: NewApplication) -> Result<ApplicationRow, StoreError>;

    async fn application(&self, id: Uuid) -> Result<Option<ApplicationRow>, StoreError>;

    /// An application together with its job. `None` when either is gone.
    async fn application_with_job(
        &self,
        id: Uuid,
    ) -> Result<Option<(ApplicationRow, JobRow)>, StoreError> {
        let Some(application) = self.application(id).await? else {
            return Ok(None);
        };
        let Some(job) = self.job(application.job_id).await? else {
            return Ok(None);
        };
        Ok(Some((application, job)))
    }

    /// Applications for one job in presentation order: best match first,
    /// newest first on ties.
    async fn applications_for_job(&self, job_id: Uuid) -> Result<Vec<ApplicationRow>, StoreError>;

    async fn save_resume_text(&self, id: Uuid, text: &str) -> Result<(), StoreError>;

    /// Reviewer-facing update. Only status and notes change here; match
    /// scores are owned by the ranking pipeline.
    async fn update_review(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        notes: &str,
    ) -> Result<Option<ApplicationRow>, StoreError>;

    /// Atomically rescores one job's applications.
    ///
    /// The backend reads the job's applications, applies `score` to each row,
    /// and persists every returned score in a single batched write. Either
    /// all returned scores land or none do. Returns the number of rows
    /// written.
    async fn rescore_applications(
        &self,
        job_id: Uuid,
        score: ScoreFn<'_>,
    ) -> Result<usize, StoreError>;
}
