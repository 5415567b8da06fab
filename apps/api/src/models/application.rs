use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Review pipeline states. Stored as uppercase text, matching the wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum ApplicationStatus {
    New,
    Review,
    Interview,
    Rejected,
    Hired,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::New => "NEW",
            ApplicationStatus::Review => "REVIEW",
            ApplicationStatus::Interview => "INTERVIEW",
            ApplicationStatus::Rejected => "REJECTED",
            ApplicationStatus::Hired => "HIRED",
        }
    }

    /// Parses the canonical uppercase form. Anything else is rejected.
    pub fn parse(value: &str) -> Option<ApplicationStatus> {
        match value {
            "NEW" => Some(ApplicationStatus::New),
            "REVIEW" => Some(ApplicationStatus::Review),
            "INTERVIEW" => Some(ApplicationStatus::Interview),
            "REJECTED" => Some(ApplicationStatus::Rejected),
            "HIRED" => Some(ApplicationStatus::Hired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub resume_path: String,
    /// NULL until extraction has run; empty string when extraction produced nothing.
    pub resume_text: Option<String>,
    pub match_score: f64,
    pub status: ApplicationStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl ApplicationRow {
    pub fn has_resume_text(&self) -> bool {
        self.resume_text.as_deref().is_some_and(|text| !text.is_empty())
    }
}

/// Insert payload for a freshly uploaded application.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub resume_path: String,
}
