//! Job board core: identity gating, the domain store facade, and the company verification
//! and application status lifecycles.

pub mod domain;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    parse_skills, Account, Application, ApplicationDraft, ApplicationId, ApplicationStatus,
    Company, CompanyUpdate, Job, JobDetails, JobDraft, JobId, JobStatus, JobType, Profile,
    ProfileId, Role, SignupRequest, Student, StudentUpdate, VerificationStatus,
};
pub use error::BoardError;
pub use identity::{require_role, IdentityProvider, Session};
pub use lifecycle::{ApplicationDecision, LifecycleController, VerificationDecision};
pub use memory::{InMemoryBoardStore, InMemorySessions};
pub use repository::{ApplicationQuery, BoardStore, JobQuery, RepositoryError};
pub use router::{board_router, status_for};
pub use service::{BoardService, SignupOutcome};
pub use views::{
    ApplicantView, AppliedJob, CompanySummary, CompanyView, Envelope, ErrorBody, JobListing,
    StudentApplicationView, StudentView,
};
