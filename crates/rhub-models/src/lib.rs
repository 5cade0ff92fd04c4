//! Shared data models for the RecruiterHub backend.
//!
//! This crate provides Serde-serializable types for:
//! - Users, companies, jobs and applications
//! - Insert payloads with boundary validation rules
//! - The registration wizard state machine and its persisted progress
//! - Mail queue and analytics documents written by triggers

pub mod application;
pub mod company;
pub mod events;
pub mod job;
pub mod registration;
pub mod user;
pub mod validation;

// Re-export common types
pub use application::{Application, ApplicationStatus, ApplicationWithJob, NewApplication};
pub use company::{Company, NewCompany};
pub use events::{AnalyticsEvent, MailMessage, MailTemplate};
pub use job::{Job, JobStatus, NewJob};
pub use registration::{
    CompanyStep, ProfileStep, RegistrationProgress, SecurityStep, StepData, WizardError,
    WizardStep,
};
pub use user::{CommunicationPreference, JobTitle, NewUser, Role, User};
pub use validation::{validation_message, PHONE_NUMBER_RE};
