//! Rerank coordinator: recomputes match scores for a job's applications.
//!
//! Scoring is a pure function of (job description, resume text), so a rerank
//! is read → score → batched write, all inside one store transaction. The
//! coordinator never touches status or notes.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::JobRow;
use crate::ranking::scorer::MatchScorer;
use crate::store::ApplicationStore;

#[derive(Debug, Clone, Serialize)]
pub struct RerankSummary {
    pub job_id: Uuid,
    pub rescored: usize,
}

/// Rescores every application of `job` that has extracted resume text.
///
/// Applications whose resume text is missing or empty are skipped and keep
/// their current score.
pub async fn rerank_job(
    store: &dyn ApplicationStore,
    scorer: &dyn MatchScorer,
    job: &JobRow,
) -> Result<RerankSummary, AppError> {
    info!("reranking applications for job {} ({})", job.id, job.title);

    let description = job.description.as_str();
    let rescored = store
        .rescore_applications(job.id, &|application| {
            if !application.has_resume_text() {
                return None;
            }
            let resume_text = application.resume_text.as_deref().unwrap_or("");
            Some(scorer.score_or_zero(description, resume_text))
        })
        .await?;

    if rescored == 0 {
        info!("no applications with resume text for job {}", job.id);
    } else {
        info!("rescored {rescored} applications for job {}", job.id);
    }
    Ok(RerankSummary {
        job_id: job.id,
        rescored,
    })
}

/// Reranks one job by id, or every job when `job_id` is `None`.
///
/// Jobs are processed sequentially; a storage failure on one job stops the
/// run and surfaces the error.
pub async fn rerank_all(
    store: &dyn ApplicationStore,
    scorer: &dyn MatchScorer,
    job_id: Option<Uuid>,
) -> Result<Vec<RerankSummary>, AppError> {
    let jobs = match job_id {
        Some(id) => {
            let job = store
                .job(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("job {id} not found")))?;
            vec![job]
        }
        None => store.jobs().await?,
    };

    let total = jobs.len();
    let mut summaries = Vec::with_capacity(total);
    for (index, job) in jobs.iter().enumerate() {
        info!("rerank {}/{total}: {}", index + 1, job.title);
        summaries.push(rerank_job(store, scorer, job).await?);
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::{ApplicationRow, ApplicationStatus, NewApplication};
    use crate::ranking::scorer::TfidfScorer;
    use crate::store::memory::FailingRescoreStore;
    use crate::store::MemoryApplicationStore;

    const JOB_DESCRIPTION: &str =
        "Senior backend engineer. Rust, Postgres, and distributed systems required.";
    const STRONG_RESUME: &str =
        "Backend engineer, eight years of Rust and Postgres, distributed systems at scale.";
    const WEAK_RESUME: &str = "Pastry chef with a passion for laminated doughs.";

    fn new_application(job_id: Uuid, name: &str) -> NewApplication {
        NewApplication {
            job_id,
            candidate_name: name.to_string(),
            candidate_email: format!("{name}@example.com"),
            resume_path: format!("resumes/{name}.pdf"),
        }
    }

    async fn seed_application(
        store: &MemoryApplicationStore,
        job_id: Uuid,
        name: &str,
        resume_text: Option<&str>,
    ) -> ApplicationRow {
        let application = store
            .create_application(new_application(job_id, name))
            .await
            .unwrap();
        if let Some(text) = resume_text {
            store.save_resume_text(application.id, text).await.unwrap();
        }
        store.application(application.id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_rerank_of_empty_job_is_a_noop() {
        let store = MemoryApplicationStore::new();
        let scorer = TfidfScorer::new();
        let job = store.create_job("Backend", JOB_DESCRIPTION).await.unwrap();

        let summary = rerank_job(&store, &scorer, &job).await.unwrap();
        assert_eq!(summary.rescored, 0);
    }

    #[tokio::test]
    async fn test_rerank_skips_applications_without_text() {
        let store = MemoryApplicationStore::new();
        let scorer = TfidfScorer::new();
        let job = store.create_job("Backend", JOB_DESCRIPTION).await.unwrap();

        let strong = seed_application(&store, job.id, "strong", Some(STRONG_RESUME)).await;
        let blank = seed_application(&store, job.id, "blank", Some("")).await;
        let unextracted = seed_application(&store, job.id, "unextracted", None).await;

        let summary = rerank_job(&store, &scorer, &job).await.unwrap();
        assert_eq!(summary.rescored, 1);

        let strong = store.application(strong.id).await.unwrap().unwrap();
        let blank = store.application(blank.id).await.unwrap().unwrap();
        let unextracted = store.application(unextracted.id).await.unwrap().unwrap();
        assert!(strong.match_score > 0.0);
        assert_eq!(blank.match_score, 0.0);
        assert_eq!(unextracted.match_score, 0.0);
    }

    #[tokio::test]
    async fn test_rerank_orders_better_matches_first() {
        let store = MemoryApplicationStore::new();
        let scorer = TfidfScorer::new();
        let job = store.create_job("Backend", JOB_DESCRIPTION).await.unwrap();

        let weak = seed_application(&store, job.id, "weak", Some(WEAK_RESUME)).await;
        let strong = seed_application(&store, job.id, "strong", Some(STRONG_RESUME)).await;

        rerank_job(&store, &scorer, &job).await.unwrap();

        let ranked = store.applications_for_job(job.id).await.unwrap();
        let order: Vec<Uuid> = ranked.iter().map(|row| row.id).collect();
        assert_eq!(order, vec![strong.id, weak.id]);
    }

    #[tokio::test]
    async fn test_rerank_is_idempotent() {
        let store = MemoryApplicationStore::new();
        let scorer = TfidfScorer::new();
        let job = store.create_job("Backend", JOB_DESCRIPTION).await.unwrap();
        seed_application(&store, job.id, "strong", Some(STRONG_RESUME)).await;
        seed_application(&store, job.id, "weak", Some(WEAK_RESUME)).await;

        rerank_job(&store, &scorer, &job).await.unwrap();
        let first: Vec<f64> = store
            .applications_for_job(job.id)
            .await
            .unwrap()
            .iter()
            .map(|row| row.match_score)
            .collect();

        rerank_job(&store, &scorer, &job).await.unwrap();
        let second: Vec<f64> = store
            .applications_for_job(job.id)
            .await
            .unwrap()
            .iter()
            .map(|row| row.match_score)
            .collect();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_rerank_never_touches_review_fields() {
        let store = MemoryApplicationStore::new();
        let scorer = TfidfScorer::new();
        let job = store.create_job("Backend", JOB_DESCRIPTION).await.unwrap();
        let application = seed_application(&store, job.id, "strong", Some(STRONG_RESUME)).await;
        store
            .update_review(application.id, ApplicationStatus::Interview, "call Monday")
            .await
            .unwrap();

        rerank_job(&store, &scorer, &job).await.unwrap();

        let after = store.application(application.id).await.unwrap().unwrap();
        assert_eq!(after.status, ApplicationStatus::Interview);
        assert_eq!(after.notes, "call Monday");
        assert!(after.match_score > 0.0);
    }

    #[tokio::test]
    async fn test_rerank_all_covers_every_job() {
        let store = MemoryApplicationStore::new();
        let scorer = TfidfScorer::new();
        let backend = store.create_job("Backend", JOB_DESCRIPTION).await.unwrap();
        let frontend = store
            .create_job("Frontend", "TypeScript and React experience.")
            .await
            .unwrap();
        seed_application(&store, backend.id, "a", Some(STRONG_RESUME)).await;
        seed_application(&store, frontend.id, "b", Some("React and TypeScript developer.")).await;

        let summaries = rerank_all(&store, &scorer, None).await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|summary| summary.rescored == 1));
    }

    #[tokio::test]
    async fn test_rerank_all_scoped_to_one_job() {
        let store = MemoryApplicationStore::new();
        let scorer = TfidfScorer::new();
        let backend = store.create_job("Backend", JOB_DESCRIPTION).await.unwrap();
        store.create_job("Frontend", "TypeScript.").await.unwrap();

        let summaries = rerank_all(&store, &scorer, Some(backend.id)).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].job_id, backend.id);
    }

    #[tokio::test]
    async fn test_rerank_all_rejects_unknown_job() {
        let store = MemoryApplicationStore::new();
        let scorer = TfidfScorer::new();

        let result = rerank_all(&store, &scorer, Some(Uuid::new_v4())).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_description_edit_then_rerank_changes_scores() {
        let store = MemoryApplicationStore::new();
        let scorer = TfidfScorer::new();
        let job = store.create_job("Backend", JOB_DESCRIPTION).await.unwrap();
        let application = seed_application(&store, job.id, "chef", Some(WEAK_RESUME)).await;

        rerank_job(&store, &scorer, &job).await.unwrap();
        let before = store
            .application(application.id)
            .await
            .unwrap()
            .unwrap()
            .match_score;

        let edited = store
            .update_job(job.id, "Head pastry chef", "Pastry chef, laminated doughs, cakes.")
            .await
            .unwrap()
            .unwrap();
        rerank_job(&store, &scorer, &edited).await.unwrap();
        let after = store
            .application(application.id)
            .await
            .unwrap()
            .unwrap()
            .match_score;

        assert!(after > before, "expected {after} > {before}");
    }

    #[tokio::test]
    async fn test_rescore_failure_surfaces_and_leaves_scores_alone() {
        let store = FailingRescoreStore {
            inner: MemoryApplicationStore::new(),
        };
        let scorer = TfidfScorer::new();
        let job = store.create_job("Backend", JOB_DESCRIPTION).await.unwrap();
        let application = store
            .create_application(new_application(job.id, "ada"))
            .await
            .unwrap();
        store
            .save_resume_text(application.id, STRONG_RESUME)
            .await
            .unwrap();

        let result = rerank_job(&store, &scorer, &job).await;
        assert!(matches!(result, Err(AppError::Store(_))));

        let untouched = store.application(application.id).await.unwrap().unwrap();
        assert_eq!(untouched.match_score, 0.0);
    }
}
