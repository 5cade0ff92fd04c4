//! In-memory storage backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use rhub_models::{Application, Company, Job, NewApplication, NewCompany, NewJob, NewUser, User};

use crate::error::{StorageError, StorageResult};
use crate::traits::Storage;

/// Next id per table. Ids start at 1 and are never reused.
struct Counters {
    users: u64,
    companies: u64,
    jobs: u64,
    applications: u64,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            users: 1,
            companies: 1,
            jobs: 1,
            applications: 1,
        }
    }
}

fn next(counter: &mut u64) -> u64 {
    let id = *counter;
    *counter += 1;
    id
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<u64, User>,
    companies: BTreeMap<u64, Company>,
    jobs: BTreeMap<u64, Job>,
    applications: BTreeMap<u64, Application>,
    ids: Counters,
}

/// Map-backed storage. Everything lives behind one lock so uniqueness
/// checks and inserts are atomic.
#[derive(Default)]
pub struct MemStorage {
    tables: RwLock<Tables>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemStorage {
    async fn get_user(&self, id: u64) -> StorageResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_user_by_firebase_uid(&self, uid: &str) -> StorageResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.firebase_uid.as_deref() == Some(uid))
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StorageError::duplicate(format!("user with email {}", user.email)));
        }
        if let Some(uid) = user.firebase_uid.as_deref() {
            if tables
                .users
                .values()
                .any(|u| u.firebase_uid.as_deref() == Some(uid))
            {
                return Err(StorageError::duplicate(format!("user with identity {}", uid)));
            }
        }

        let id = next(&mut tables.ids.users);
        let user = User::from_new(id, user);
        tables.users.insert(id, user.clone());
        debug!(user_id = id, role = user.role.as_str(), "Created user");
        Ok(user)
    }

    async fn get_company(&self, id: u64) -> StorageResult<Option<Company>> {
        Ok(self.tables.read().await.companies.get(&id).cloned())
    }

    async fn get_company_by_user_id(&self, user_id: u64) -> StorageResult<Option<Company>> {
        let tables = self.tables.read().await;
        Ok(tables
            .companies
            .values()
            .find(|c| c.user_id == user_id)
            .cloned())
    }

    async fn create_company(&self, company: NewCompany) -> StorageResult<Company> {
        let mut tables = self.tables.write().await;
        let id = next(&mut tables.ids.companies);
        let company = Company::from_new(id, company);
        tables.companies.insert(id, company.clone());
        debug!(company_id = id, user_id = company.user_id, "Created company");
        Ok(company)
    }

    async fn get_jobs(&self) -> StorageResult<Vec<Job>> {
        Ok(self.tables.read().await.jobs.values().cloned().collect())
    }

    async fn get_job(&self, id: u64) -> StorageResult<Option<Job>> {
        Ok(self.tables.read().await.jobs.get(&id).cloned())
    }

    async fn get_jobs_by_employer(&self, employer_id: u64) -> StorageResult<Vec<Job>> {
        let tables = self.tables.read().await;
        Ok(tables
            .jobs
            .values()
            .filter(|j| j.employer_id == employer_id)
            .cloned()
            .collect())
    }

    async fn create_job(&self, job: NewJob) -> StorageResult<Job> {
        let mut tables = self.tables.write().await;
        let id = next(&mut tables.ids.jobs);
        let job = Job::from_new(id, job);
        tables.jobs.insert(id, job.clone());
        debug!(job_id = id, employer_id = job.employer_id, "Created job");
        Ok(job)
    }

    async fn get_application(&self, id: u64) -> StorageResult<Option<Application>> {
        Ok(self.tables.read().await.applications.get(&id).cloned())
    }

    async fn get_applications_by_candidate(&self, candidate_id: u64) -> StorageResult<Vec<Application>> {
        let tables = self.tables.read().await;
        Ok(tables
            .applications
            .values()
            .filter(|a| a.candidate_id == candidate_id)
            .cloned()
            .collect())
    }

    async fn get_applications_by_job(&self, job_id: u64) -> StorageResult<Vec<Application>> {
        let tables = self.tables.read().await;
        Ok(tables
            .applications
            .values()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn create_application(&self, application: NewApplication) -> StorageResult<Application> {
        let mut tables = self.tables.write().await;
        let id = next(&mut tables.ids.applications);
        let application = Application::from_new(id, application);
        tables.applications.insert(id, application.clone());
        debug!(
            application_id = id,
            job_id = application.job_id,
            candidate_id = application.candidate_id,
            "Created application"
        );
        Ok(application)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhub_models::{ApplicationStatus, CommunicationPreference, JobStatus, Role};

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            role: Role::Employer,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone_number: None,
            job_title: None,
            linkedin_url: None,
            profile_picture: None,
            communication_preference: CommunicationPreference::Email,
            company: None,
            bio: None,
            firebase_uid: Some(format!("uid-{}", email)),
            mfa_enabled: false,
        }
    }

    fn new_job(employer_id: u64) -> NewJob {
        NewJob {
            title: "Engineer".to_string(),
            company: "Acme".to_string(),
            description: "Build".to_string(),
            requirements: "Rust".to_string(),
            location: "Remote".to_string(),
            employer_id,
            company_id: None,
        }
    }

    #[tokio::test]
    async fn test_users_get_sequential_ids() {
        let storage = MemStorage::new();
        let a = storage.create_user(new_user("a@example.com")).await.unwrap();
        let b = storage.create_user(new_user("b@example.com")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(storage.get_user(2).await.unwrap().unwrap().email, "b@example.com");
        assert!(storage.get_user(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let storage = MemStorage::new();
        storage.create_user(new_user("a@example.com")).await.unwrap();
        let err = storage
            .create_user(new_user("A@Example.com"))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn test_duplicate_identity_rejected() {
        let storage = MemStorage::new();
        storage.create_user(new_user("a@example.com")).await.unwrap();

        let mut other = new_user("b@example.com");
        other.firebase_uid = Some("uid-a@example.com".to_string());
        let err = storage.create_user(other).await.unwrap_err();
        assert!(err.is_duplicate());

        let mut unlinked = new_user("c@example.com");
        unlinked.firebase_uid = None;
        storage.create_user(unlinked).await.unwrap();
    }

    #[tokio::test]
    async fn test_lookup_by_email_and_uid() {
        let storage = MemStorage::new();
        let user = storage.create_user(new_user("a@example.com")).await.unwrap();
        let by_email = storage.get_user_by_email("a@example.com").await.unwrap();
        assert_eq!(by_email.unwrap().id, user.id);
        let by_uid = storage
            .get_user_by_firebase_uid("uid-a@example.com")
            .await
            .unwrap();
        assert_eq!(by_uid.unwrap().id, user.id);
        assert!(storage.get_user_by_firebase_uid("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_jobs_default_to_draft_with_sequential_ids() {
        let storage = MemStorage::new();
        let first = storage.create_job(new_job(1)).await.unwrap();
        let second = storage.create_job(new_job(2)).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));
        assert_eq!(first.status, JobStatus::Draft);
        assert_eq!(storage.get_jobs().await.unwrap().len(), 2);
        let by_employer = storage.get_jobs_by_employer(2).await.unwrap();
        assert_eq!(by_employer.len(), 1);
        assert_eq!(by_employer[0].id, 2);
    }

    #[tokio::test]
    async fn test_applications_default_to_pending() {
        let storage = MemStorage::new();
        let app = storage
            .create_application(NewApplication {
                job_id: 99,
                candidate_id: 5,
            })
            .await
            .unwrap();
        assert_eq!(app.id, 1);
        assert_eq!(app.status, ApplicationStatus::Pending);
        assert_eq!(storage.get_applications_by_candidate(5).await.unwrap().len(), 1);
        assert_eq!(storage.get_applications_by_job(99).await.unwrap().len(), 1);
        assert!(storage.get_applications_by_job(1).await.unwrap().is_empty());
        assert!(storage.get_application(1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_company_by_owner() {
        let storage = MemStorage::new();
        let company = storage
            .create_company(NewCompany {
                user_id: 3,
                name: "Acme".to_string(),
                website: None,
                industry: None,
                size: None,
                description: None,
            })
            .await
            .unwrap();
        assert_eq!(company.id, 1);
        assert_eq!(
            storage.get_company_by_user_id(3).await.unwrap().unwrap().name,
            "Acme"
        );
        assert!(storage.get_company_by_user_id(4).await.unwrap().is_none());
        assert!(storage.get_company(1).await.unwrap().is_some());
    }
}
