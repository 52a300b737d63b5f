//! Company verification and application status state machines.
//!
//! Both machines are linear: `pending` moves once to a terminal state and never back. Every
//! transition re-reads the current row, checks the actor, then writes through a conditional
//! store update so a racing writer surfaces as [`BoardError::ConcurrentModification`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Company, Job, JobId, JobStatus, ProfileId,
    Role, VerificationStatus,
};
use super::error::BoardError;
use super::identity::Session;
use super::repository::{BoardStore, RepositoryError};

/// Admin review outcome for a pending company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationDecision {
    Approve,
    Reject,
}

impl VerificationDecision {
    pub const fn target(self) -> VerificationStatus {
        match self {
            VerificationDecision::Approve => VerificationStatus::Approved,
            VerificationDecision::Reject => VerificationStatus::Rejected,
        }
    }
}

/// Company decision on a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationDecision {
    Shortlist,
    Reject,
}

impl ApplicationDecision {
    pub const fn target(self) -> ApplicationStatus {
        match self {
            ApplicationDecision::Shortlist => ApplicationStatus::Shortlisted,
            ApplicationDecision::Reject => ApplicationStatus::Rejected,
        }
    }
}

pub struct LifecycleController<S> {
    store: Arc<S>,
}

impl<S> Clone for LifecycleController<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> LifecycleController<S>
where
    S: BoardStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Move a pending company to approved or rejected. Admin only.
    pub fn review_company(
        &self,
        session: &Session,
        company_id: &ProfileId,
        decision: VerificationDecision,
    ) -> Result<Company, BoardError> {
        let target = decision.target();
        if !session.is_admin() {
            warn!(actor = %session.user_id, company = %company_id, "non-admin verification attempt");
            return Err(BoardError::forbidden(
                "only administrators may review company verification",
            ));
        }

        let current = self
            .store
            .fetch_company(company_id)?
            .ok_or_else(|| BoardError::not_found("company", company_id))?;

        if current.verification_status.is_terminal() {
            return Err(BoardError::InvalidTransition {
                entity: "company verification",
                from: current.verification_status.label(),
                to: target.label(),
            });
        }

        let updated = self
            .store
            .update_verification(company_id, VerificationStatus::Pending, target)?
            .ok_or_else(|| BoardError::conflict("company", company_id))?;

        info!(
            admin = %session.user_id,
            company = %company_id,
            status = target.label(),
            "company verification reviewed"
        );
        Ok(updated)
    }

    /// Confirm the session's company may post right now, reading verification fresh.
    pub fn ensure_can_post(&self, session: &Session) -> Result<Company, BoardError> {
        if session.role != Role::Company {
            return Err(BoardError::forbidden("only companies may post jobs"));
        }

        let company = self
            .store
            .fetch_company(&session.user_id)?
            .ok_or_else(|| BoardError::not_found("company", &session.user_id))?;

        if company.verification_status != VerificationStatus::Approved {
            warn!(
                company = %company.id,
                status = company.verification_status.label(),
                "job posting blocked by verification status"
            );
            return Err(BoardError::forbidden(format!(
                "company verification is {}",
                company.verification_status.label()
            )));
        }

        Ok(company)
    }

    /// Shortlist or reject a pending application. Only the company owning the job may decide.
    pub fn decide_application(
        &self,
        session: &Session,
        application_id: &ApplicationId,
        decision: ApplicationDecision,
    ) -> Result<Application, BoardError> {
        let target = decision.target();
        let current = self
            .store
            .fetch_application(application_id)?
            .ok_or_else(|| BoardError::not_found("application", application_id))?;

        let job = self
            .store
            .fetch_job(&current.job_id)?
            .ok_or_else(|| BoardError::not_found("job", &current.job_id))?;

        if session.role != Role::Company || !session.owns(&job.company_id) {
            warn!(
                actor = %session.user_id,
                application = %application_id,
                "application decision by non-owner"
            );
            return Err(BoardError::forbidden(
                "only the company that posted the job may change application status",
            ));
        }

        if job.status == JobStatus::Closed {
            return Err(BoardError::JobClosed(job.id));
        }

        if current.status.is_terminal() {
            return Err(BoardError::InvalidTransition {
                entity: "application",
                from: current.status.label(),
                to: target.label(),
            });
        }

        let updated = match self.store.update_application_status(
            application_id,
            ApplicationStatus::Pending,
            target,
        ) {
            Ok(Some(updated)) => updated,
            Ok(None) => return Err(BoardError::conflict("application", application_id)),
            Err(RepositoryError::PreconditionFailed) => {
                warn!(
                    job = %job.id,
                    application = %application_id,
                    "job closed before decision applied"
                );
                return Err(BoardError::JobClosed(job.id));
            }
            Err(other) => return Err(other.into()),
        };

        info!(
            company = %session.user_id,
            application = %application_id,
            status = target.label(),
            "application status updated"
        );
        Ok(updated)
    }

    /// Close an active job. Only the owning company may close it.
    pub fn close_job(&self, session: &Session, job_id: &JobId) -> Result<Job, BoardError> {
        let current = self
            .store
            .fetch_job(job_id)?
            .ok_or_else(|| BoardError::not_found("job", job_id))?;

        if session.role != Role::Company || !session.owns(&current.company_id) {
            return Err(BoardError::forbidden(
                "only the company that posted the job may close it",
            ));
        }

        if current.status == JobStatus::Closed {
            return Err(BoardError::InvalidTransition {
                entity: "job",
                from: JobStatus::Closed.label(),
                to: JobStatus::Closed.label(),
            });
        }

        let closed = self
            .store
            .update_job_status(job_id, JobStatus::Active, JobStatus::Closed)?
            .ok_or_else(|| BoardError::conflict("job", job_id))?;

        info!(company = %session.user_id, job = %job_id, "job closed");
        Ok(closed)
    }
}
