//! Storage trait.

use async_trait::async_trait;

use rhub_models::{Application, Company, Job, NewApplication, NewCompany, NewJob, NewUser, User};

use crate::error::StorageResult;

/// Persistence operations used by the request handlers.
///
/// Lookups return `Ok(None)` for missing records; `Err` is reserved for
/// backend failures and constraint violations. Lists are ordered by id.
#[async_trait]
pub trait Storage: Send + Sync {
    // Users
    async fn get_user(&self, id: u64) -> StorageResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>>;
    async fn get_user_by_firebase_uid(&self, uid: &str) -> StorageResult<Option<User>>;
    /// Fails with `StorageError::Duplicate` when the email is taken.
    async fn create_user(&self, user: NewUser) -> StorageResult<User>;

    // Companies
    async fn get_company(&self, id: u64) -> StorageResult<Option<Company>>;
    async fn get_company_by_user_id(&self, user_id: u64) -> StorageResult<Option<Company>>;
    async fn create_company(&self, company: NewCompany) -> StorageResult<Company>;

    // Jobs
    async fn get_jobs(&self) -> StorageResult<Vec<Job>>;
    async fn get_job(&self, id: u64) -> StorageResult<Option<Job>>;
    async fn get_jobs_by_employer(&self, employer_id: u64) -> StorageResult<Vec<Job>>;
    async fn create_job(&self, job: NewJob) -> StorageResult<Job>;

    // Applications
    async fn get_application(&self, id: u64) -> StorageResult<Option<Application>>;
    async fn get_applications_by_candidate(&self, candidate_id: u64) -> StorageResult<Vec<Application>>;
    async fn get_applications_by_job(&self, job_id: u64) -> StorageResult<Vec<Application>>;
    async fn create_application(&self, application: NewApplication) -> StorageResult<Application>;
}
