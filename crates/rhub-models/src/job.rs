//! Job postings.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Posting status. New postings always start as drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Draft,
    Published,
    Closed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Published => "published",
            JobStatus::Closed => "closed",
        }
    }
}

/// A job posting authored by an employer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: u64,
    pub title: String,
    pub company: String,
    pub description: String,
    pub requirements: String,
    pub location: String,
    pub employer_id: u64,
    pub company_id: Option<u64>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    /// Opaque scoring payload; never computed server-side.
    pub ai_score: Option<serde_json::Value>,
}

impl Job {
    /// Build a stored job. Status and score are server-assigned.
    pub fn from_new(id: u64, new: NewJob) -> Self {
        Self {
            id,
            title: new.title,
            company: new.company,
            description: new.description,
            requirements: new.requirements,
            location: new.location,
            employer_id: new.employer_id,
            company_id: new.company_id,
            status: JobStatus::default(),
            created_at: Utc::now(),
            ai_score: None,
        }
    }
}

/// Payload accepted by `POST /api/jobs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Company is required"))]
    pub company: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[validate(length(min = 1, message = "Requirements are required"))]
    pub requirements: String,

    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,

    /// Overwritten with the session user before insert.
    #[serde(default)]
    pub employer_id: u64,

    #[serde(default)]
    pub company_id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_job() -> NewJob {
        NewJob {
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            description: "Build services".to_string(),
            requirements: "Rust".to_string(),
            location: "Remote".to_string(),
            employer_id: 7,
            company_id: None,
        }
    }

    #[test]
    fn test_job_defaults_to_draft() {
        let job = Job::from_new(1, new_job());
        assert_eq!(job.status, JobStatus::Draft);
        assert!(job.ai_score.is_none());
        assert_eq!(job.employer_id, 7);
    }

    #[test]
    fn test_missing_title_rejected() {
        let mut job = new_job();
        job.title = String::new();
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_client_cannot_set_status() {
        let json = serde_json::json!({
            "title": "T",
            "company": "C",
            "description": "D",
            "requirements": "R",
            "location": "L",
            "status": "published"
        });
        let new: NewJob = serde_json::from_value(json).unwrap();
        let job = Job::from_new(3, new);
        assert_eq!(job.status, JobStatus::Draft);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&JobStatus::Published).unwrap(), "\"published\"");
        assert_eq!(JobStatus::Closed.as_str(), "closed");
    }
}
