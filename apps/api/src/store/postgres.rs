//! Postgres-backed `ApplicationStore`.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::application::{ApplicationRow, ApplicationStatus, NewApplication};
use crate::models::job::JobRow;
use crate::store::{ApplicationStore, ScoreFn, StoreError};

const APPLICATION_COLUMNS: &str = "id, job_id, candidate_name, candidate_email, resume_path, \
                                   resume_text, match_score, status, notes, created_at";

pub struct PgApplicationStore {
    pool: PgPool,
    row_locking: bool,
}

impl PgApplicationStore {
    /// `row_locking` controls whether a rescore takes `FOR UPDATE SKIP LOCKED`
    /// on the rows it reads. Leave it on unless the deployment cannot afford
    /// row locks.
    pub fn new(pool: PgPool, row_locking: bool) -> Self {
        Self { pool, row_locking }
    }
}

#[async_trait]
impl ApplicationStore for PgApplicationStore {
    async fn create_job(&self, title: &str, description: &str) -> Result<JobRow, StoreError> {
        let job = sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs (id, title, description)
            VALUES ($1, $2, $3)
            RETURNING id, title, description, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(job)
    }

    async fn job(&self, id: Uuid) -> Result<Option<JobRow>, StoreError> {
        let job = sqlx::query_as::<_, JobRow>(
            "SELECT id, title, description, created_at, updated_at FROM jobs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    async fn jobs(&self) -> Result<Vec<JobRow>, StoreError> {
        let jobs = sqlx::query_as::<_, JobRow>(
            "SELECT id, title, description, created_at, updated_at FROM jobs \
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }

    async fn update_job(
        &self,
        id: Uuid,
        title: &str,
        description: &str,
    ) -> Result<Option<JobRow>, StoreError> {
        let job = sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs
            SET title = $2, description = $3, updated_at = now()
            WHERE id = $1
            RETURNING id, title, description, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    async fn delete_job(&self, id: Uuid) -> Result<bool, StoreError> {
        // Applications go with the job via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_application(&self, new: NewApplication) -> Result<ApplicationRow, StoreError> {
        let application = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            INSERT INTO applications (id, job_id, candidate_name, candidate_email, resume_path)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {APPLICATION_COLUMNS}
            "#,
        ))
        .bind(Uuid::new_v4())
        .bind(new.job_id)
        .bind(&new.candidate_name)
        .bind(&new.candidate_email)
        .bind(&new.resume_path)
        .fetch_one(&self.pool)
        .await?;

        Ok(application)
    }

    async fn application(&self, id: Uuid) -> Result<Option<ApplicationRow>, StoreError> {
        let application = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(application)
    }

    async fn applications_for_job(&self, job_id: Uuid) -> Result<Vec<ApplicationRow>, StoreError> {
        let applications = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE job_id = $1 \
             ORDER BY match_score DESC, created_at DESC",
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(applications)
    }

    async fn save_resume_text(&self, id: Uuid, text: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE applications SET resume_text = $2 WHERE id = $1")
            .bind(id)
            .bind(text)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_review(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        notes: &str,
    ) -> Result<Option<ApplicationRow>, StoreError> {
        let application = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            UPDATE applications
            SET status = $2, notes = $3
            WHERE id = $1
            RETURNING {APPLICATION_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(application)
    }

    async fn rescore_applications(
        &self,
        job_id: Uuid,
        score: ScoreFn<'_>,
    ) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;

        let rows = lock_job_applications(&mut tx, job_id, self.row_locking).await?;
        if rows.is_empty() {
            return Ok(0);
        }

        let mut ids: Vec<Uuid> = Vec::new();
        let mut scores: Vec<f64> = Vec::new();
        for row in &rows {
            if let Some(new_score) = score(row) {
                ids.push(row.id);
                scores.push(new_score);
            }
        }
        if ids.is_empty() {
            // Dropping the transaction rolls it back and releases the locks.
            return Ok(0);
        }

        sqlx::query(
            r#"
            UPDATE applications AS a
            SET match_score = s.match_score
            FROM (SELECT unnest($1::uuid[]) AS id, unnest($2::float8[]) AS match_score) AS s
            WHERE a.id = s.id
            "#,
        )
        .bind(&ids)
        .bind(&scores)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ids.len())
    }
}

/// Reads one job's applications inside the rescore transaction.
///
/// With `row_locking` the rows are taken `FOR UPDATE SKIP LOCKED`: rows
/// already locked by a concurrent rescore are left to that rescore instead of
/// blocking this one.
async fn lock_job_applications(
    tx: &mut Transaction<'_, Postgres>,
    job_id: Uuid,
    row_locking: bool,
) -> Result<Vec<ApplicationRow>, StoreError> {
    let sql = if row_locking {
        format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE job_id = $1 \
             ORDER BY created_at FOR UPDATE SKIP LOCKED",
        )
    } else {
        format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE job_id = $1 \
             ORDER BY created_at",
        )
    };

    let rows = sqlx::query_as::<_, ApplicationRow>(&sql)
        .bind(job_id)
        .fetch_all(&mut **tx)
        .await?;

    Ok(rows)
}
