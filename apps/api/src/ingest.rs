//! Application ingestion: extract resume text, persist it, rerank the job.
//!
//! This is the unit of work the dispatcher runs after an upload. Extraction
//! and persistence are separate steps on purpose: once the text is saved, a
//! crash before the rerank leaves a recoverable record that the next rerank
//! picks up.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::extract_resume_text;
use crate::ranking::rerank::rerank_job;
use crate::ranking::scorer::MatchScorer;
use crate::store::ApplicationStore;

/// Terminal outcome of one ingestion run.
#[derive(Debug, Clone)]
pub enum IngestStatus {
    /// Text extracted (possibly empty) and the job reranked.
    Completed { job_id: Uuid, rescored: usize },
    /// The application disappeared before processing started.
    NotFound,
}

pub struct Ingestor {
    store: Arc<dyn ApplicationStore>,
    scorer: Arc<dyn MatchScorer>,
    upload_root: PathBuf,
}

impl Ingestor {
    pub fn new(
        store: Arc<dyn ApplicationStore>,
        scorer: Arc<dyn MatchScorer>,
        upload_root: PathBuf,
    ) -> Self {
        Self {
            store,
            scorer,
            upload_root,
        }
    }

    /// Runs the full pipeline for one application: extract, save, rerank.
    ///
    /// Extraction problems degrade to empty text and the run still completes.
    /// Only storage failures surface as errors.
    pub async fn process_application(
        &self,
        application_id: Uuid,
    ) -> Result<IngestStatus, AppError> {
        info!("processing application {application_id}");

        let Some((application, job)) = self.store.application_with_job(application_id).await?
        else {
            error!("application {application_id} not found, nothing to process");
            return Ok(IngestStatus::NotFound);
        };

        let resume_file = self.upload_root.join(&application.resume_path);
        let text =
            tokio::task::spawn_blocking(move || extract_resume_text(&resume_file).into_text())
                .await
                .unwrap_or_else(|e| {
                    error!("extraction task for application {application_id} panicked: {e}");
                    String::new()
                });

        self.store.save_resume_text(application_id, &text).await?;
        info!(
            "saved {} chars of resume text for application {application_id}",
            text.chars().count()
        );

        let summary = rerank_job(self.store.as_ref(), self.scorer.as_ref(), &job).await?;
        info!(
            "application {application_id} processed, {} applications rescored for job {}",
            summary.rescored, job.id
        );
        Ok(IngestStatus::Completed {
            job_id: job.id,
            rescored: summary.rescored,
        })
    }
}
