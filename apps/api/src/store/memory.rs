//! In-memory `ApplicationStore` for tests and single-process deployments.
//!
//! The whole store sits behind one mutex, so a rescore is atomic here too.
//! What this backend cannot give you is cross-process locking.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::application::{ApplicationRow, ApplicationStatus, NewApplication};
use crate::models::job::JobRow;
use crate::store::{ApplicationStore, ScoreFn, StoreError};

#[derive(Default)]
pub struct MemoryApplicationStore {
    inner: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    jobs: HashMap<Uuid, JobRow>,
    applications: HashMap<Uuid, ApplicationRow>,
}

impl MemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ApplicationStore for MemoryApplicationStore {
    async fn create_job(&self, title: &str, description: &str) -> Result<JobRow, StoreError> {
        let now = Utc::now();
        let job = JobRow {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.tables().jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn job(&self, id: Uuid) -> Result<Option<JobRow>, StoreError> {
        Ok(self.tables().jobs.get(&id).cloned())
    }

    async fn jobs(&self) -> Result<Vec<JobRow>, StoreError> {
        let mut jobs: Vec<JobRow> = self.tables().jobs.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn update_job(
        &self,
        id: Uuid,
        title: &str,
        description: &str,
    ) -> Result<Option<JobRow>, StoreError> {
        let mut tables = self.tables();
        let Some(job) = tables.jobs.get_mut(&id) else {
            return Ok(None);
        };
        job.title = title.to_string();
        job.description = description.to_string();
        job.updated_at = Utc::now();
        Ok(Some(job.clone()))
    }

    async fn delete_job(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables();
        let existed = tables.jobs.remove(&id).is_some();
        if existed {
            tables.applications.retain(|_, application| application.job_id != id);
        }
        Ok(existed)
    }

    async fn create_application(&self, new: NewApplication) -> Result<ApplicationRow, StoreError> {
        let application = ApplicationRow {
            id: Uuid::new_v4(),
            job_id: new.job_id,
            candidate_name: new.candidate_name,
            candidate_email: new.candidate_email,
            resume_path: new.resume_path,
            resume_text: None,
            match_score: 0.0,
            status: ApplicationStatus::New,
            notes: String::new(),
            created_at: Utc::now(),
        };
        self.tables()
            .applications
            .insert(application.id, application.clone());
        Ok(application)
    }

    async fn application(&self, id: Uuid) -> Result<Option<ApplicationRow>, StoreError> {
        Ok(self.tables().applications.get(&id).cloned())
    }

    async fn applications_for_job(&self, job_id: Uuid) -> Result<Vec<ApplicationRow>, StoreError> {
        let mut rows: Vec<ApplicationRow> = self
            .tables()
            .applications
            .values()
            .filter(|application| application.job_id == job_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.match_score
                .total_cmp(&a.match_score)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(rows)
    }

    async fn save_resume_text(&self, id: Uuid, text: &str) -> Result<(), StoreError> {
        if let Some(application) = self.tables().applications.get_mut(&id) {
            application.resume_text = Some(text.to_string());
        }
        Ok(())
    }

    async fn update_review(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        notes: &str,
    ) -> Result<Option<ApplicationRow>, StoreError> {
        let mut tables = self.tables();
        let Some(application) = tables.applications.get_mut(&id) else {
            return Ok(None);
        };
        application.status = status;
        application.notes = notes.to_string();
        Ok(Some(application.clone()))
    }

    async fn rescore_applications(
        &self,
        job_id: Uuid,
        score: ScoreFn<'_>,
    ) -> Result<usize, StoreError> {
        let mut tables = self.tables();

        let mut rows: Vec<&ApplicationRow> = tables
            .applications
            .values()
            .filter(|application| application.job_id == job_id)
            .collect();
        rows.sort_by_key(|application| application.created_at);

        let mut updates: Vec<(Uuid, f64)> = Vec::new();
        for row in rows {
            if let Some(new_score) = score(row) {
                updates.push((row.id, new_score));
            }
        }

        let written = updates.len();
        for (id, new_score) in updates {
            if let Some(application) = tables.applications.get_mut(&id) {
                application.match_score = new_score;
            }
        }
        Ok(written)
    }
}

/// Store wrapper whose rescore always fails. Failure injection for
/// coordinator and ingestion tests.
#[cfg(test)]
pub struct FailingRescoreStore {
    pub inner: MemoryApplicationStore,
}

#[cfg(test)]
#[async_trait]
impl ApplicationStore for FailingRescoreStore {
    async fn create_job(&self, title: &str, description: &str) -> Result<JobRow, StoreError> {
        self.inner.create_job(title, description).await
    }

    async fn job(&self, id: Uuid) -> Result<Option<JobRow>, StoreError> {
        self.inner.job(id).await
    }

    async fn jobs(&self) -> Result<Vec<JobRow>, StoreError> {
        self.inner.jobs().await
    }

    async fn update_job(
        &self,
        id: Uuid,
        title: &str,
        description: &str,
    ) -> Result<Option<JobRow>, StoreError> {
        self.inner.update_job(id, title, description).await
    }

    async fn delete_job(&self, id: Uuid) -> Result<bool, StoreError> {
        self.inner.delete_job(id).await
    }

    async fn create_application(&self, new: NewApplication) -> Result<ApplicationRow, StoreError> {
        self.inner.create_application(new).await
    }

    async fn application(&self, id: Uuid) -> Result<Option<ApplicationRow>, StoreError> {
        self.inner.application(id).await
    }

    async fn applications_for_job(&self, job_id: Uuid) -> Result<Vec<ApplicationRow>, StoreError> {
        self.inner.applications_for_job(job_id).await
    }

    async fn save_resume_text(&self, id: Uuid, text: &str) -> Result<(), StoreError> {
        self.inner.save_resume_text(id, text).await
    }

    async fn update_review(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        notes: &str,
    ) -> Result<Option<ApplicationRow>, StoreError> {
        self.inner.update_review(id, status, notes).await
    }

    async fn rescore_applications(
        &self,
        _job_id: Uuid,
        _score: ScoreFn<'_>,
    ) -> Result<usize, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_application(job_id: Uuid, name: &str) -> NewApplication {
        NewApplication {
            job_id,
            candidate_name: name.to_string(),
            candidate_email: format!("{name}@example.com"),
            resume_path: format!("resumes/{name}.pdf"),
        }
    }

    fn set_score(store: &MemoryApplicationStore, id: Uuid, score: f64) {
        store
            .tables()
            .applications
            .get_mut(&id)
            .unwrap()
            .match_score = score;
    }

    fn shift_created_at(store: &MemoryApplicationStore, id: Uuid, seconds: i64) {
        store
            .tables()
            .applications
            .get_mut(&id)
            .unwrap()
            .created_at += Duration::seconds(seconds);
    }

    #[tokio::test]
    async fn test_listing_orders_by_score_then_recency() {
        let store = MemoryApplicationStore::new();
        let job = store.create_job("Backend", "Rust services").await.unwrap();
        let low = store
            .create_application(new_application(job.id, "low"))
            .await
            .unwrap();
        let recent = store
            .create_application(new_application(job.id, "recent"))
            .await
            .unwrap();
        let older = store
            .create_application(new_application(job.id, "older"))
            .await
            .unwrap();

        set_score(&store, low.id, 40.0);
        set_score(&store, recent.id, 90.0);
        set_score(&store, older.id, 90.0);
        shift_created_at(&store, older.id, -3600);

        let rows = store.applications_for_job(job.id).await.unwrap();
        let order: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        assert_eq!(order, vec![recent.id, older.id, low.id]);
    }

    #[tokio::test]
    async fn test_delete_job_removes_its_applications() {
        let store = MemoryApplicationStore::new();
        let job = store.create_job("Backend", "Rust services").await.unwrap();
        let other = store.create_job("Frontend", "TypeScript").await.unwrap();
        let doomed = store
            .create_application(new_application(job.id, "doomed"))
            .await
            .unwrap();
        let kept = store
            .create_application(new_application(other.id, "kept"))
            .await
            .unwrap();

        assert!(store.delete_job(job.id).await.unwrap());
        assert!(store.application(doomed.id).await.unwrap().is_none());
        assert!(store.application(kept.id).await.unwrap().is_some());
        assert!(!store.delete_job(job.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_review_never_touches_the_score() {
        let store = MemoryApplicationStore::new();
        let job = store.create_job("Backend", "Rust services").await.unwrap();
        let application = store
            .create_application(new_application(job.id, "ada"))
            .await
            .unwrap();
        set_score(&store, application.id, 77.5);

        let updated = store
            .update_review(application.id, ApplicationStatus::Interview, "strong")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.status, ApplicationStatus::Interview);
        assert_eq!(updated.notes, "strong");
        assert_eq!(updated.match_score, 77.5);
    }

    #[tokio::test]
    async fn test_rescore_applies_scores_and_skips_none() {
        let store = MemoryApplicationStore::new();
        let job = store.create_job("Backend", "Rust services").await.unwrap();
        let scored = store
            .create_application(new_application(job.id, "scored"))
            .await
            .unwrap();
        let skipped = store
            .create_application(new_application(job.id, "skipped"))
            .await
            .unwrap();

        let written = store
            .rescore_applications(job.id, &|row| {
                if row.id == scored.id {
                    Some(62.5)
                } else {
                    None
                }
            })
            .await
            .unwrap();

        assert_eq!(written, 1);
        let scored_row = store.application(scored.id).await.unwrap().unwrap();
        let skipped_row = store.application(skipped.id).await.unwrap().unwrap();
        assert_eq!(scored_row.match_score, 62.5);
        assert_eq!(skipped_row.match_score, 0.0);
        // Review fields are out of the rescore's reach.
        assert_eq!(scored_row.status, ApplicationStatus::New);
        assert_eq!(scored_row.notes, "");
    }

    #[tokio::test]
    async fn test_rescore_of_unknown_job_writes_nothing() {
        let store = MemoryApplicationStore::new();
        let written = store
            .rescore_applications(Uuid::new_v4(), &|_| Some(50.0))
            .await
            .unwrap();
        assert_eq!(written, 0);
    }
}
