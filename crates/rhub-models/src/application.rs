//! Candidate applications.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::job::Job;

/// Review status of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

/// A candidate's application to a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: u64,
    pub job_id: u64,
    pub candidate_id: u64,
    pub status: ApplicationStatus,
    /// Placeholder match score; always null until a scorer exists.
    pub ai_match_score: Option<f64>,
    pub ai_insights: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn from_new(id: u64, new: NewApplication) -> Self {
        let now = Utc::now();
        Self {
            id,
            job_id: new.job_id,
            candidate_id: new.candidate_id,
            status: ApplicationStatus::default(),
            ai_match_score: None,
            ai_insights: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Payload accepted by `POST /api/applications`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    #[validate(range(min = 1, message = "Job id is required"))]
    pub job_id: u64,

    /// Overwritten with the session user before insert.
    #[serde(default)]
    pub candidate_id: u64,
}

/// Application joined with the job it targets, as listed on the candidate profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationWithJob {
    #[serde(flatten)]
    pub application: Application,
    pub job: Option<Job>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_defaults_to_pending() {
        let app = Application::from_new(
            1,
            NewApplication {
                job_id: 4,
                candidate_id: 9,
            },
        );
        assert_eq!(app.status, ApplicationStatus::Pending);
        assert!(app.ai_match_score.is_none());
        assert!(app.ai_insights.is_none());
        assert_eq!(app.created_at, app.updated_at);
    }

    #[test]
    fn test_job_id_required() {
        let json = serde_json::json!({});
        assert!(serde_json::from_value::<NewApplication>(json).is_err());

        let zero = NewApplication {
            job_id: 0,
            candidate_id: 0,
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_string_job_id_rejected() {
        let json = serde_json::json!({ "jobId": "four" });
        assert!(serde_json::from_value::<NewApplication>(json).is_err());
    }

    #[test]
    fn test_with_job_flattens() {
        let app = Application::from_new(
            2,
            NewApplication {
                job_id: 4,
                candidate_id: 9,
            },
        );
        let value = serde_json::to_value(ApplicationWithJob {
            application: app,
            job: None,
        })
        .unwrap();
        assert_eq!(value["jobId"], 4);
        assert_eq!(value["status"], "pending");
        assert!(value["job"].is_null());
    }
}
