use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{
    Account, Application, ApplicationDraft, ApplicationId, ApplicationStatus, Company,
    CompanyUpdate, Job, JobDetails, JobDraft, JobId, JobStatus, Profile, ProfileId, Role,
    SignupRequest, Student, StudentUpdate,
};
use super::error::BoardError;
use super::identity::{require_role, IdentityProvider, Session};
use super::lifecycle::{ApplicationDecision, LifecycleController, VerificationDecision};
use super::repository::{ApplicationQuery, BoardStore, JobQuery, RepositoryError};
use super::views::{
    AppliedJob, ApplicantView, CompanySummary, CompanyView, JobListing, StudentApplicationView,
    StudentView,
};

const ANY_ROLE: &[Role] = &[Role::Student, Role::Company, Role::Admin];

static PROFILE_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_profile_id() -> ProfileId {
    let id = PROFILE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ProfileId(format!("usr-{id:06}"))
}

fn next_job_id() -> JobId {
    let id = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    JobId(format!("job-{id:06}"))
}

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

/// Result of a successful signup: the stored profile and a bearer token for it.
#[derive(Debug, Clone, Serialize)]
pub struct SignupOutcome {
    pub profile: Profile,
    pub token: String,
}

/// Typed CRUD facade over the board collections.
///
/// Every call receives the caller's [`Session`] explicitly. Role gating happens before the
/// store is touched; verification and application status changes go through the
/// [`LifecycleController`].
pub struct BoardService<S, I> {
    store: Arc<S>,
    identity: Arc<I>,
    lifecycle: LifecycleController<S>,
}

impl<S, I> BoardService<S, I>
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    pub fn new(store: Arc<S>, identity: Arc<I>) -> Self {
        let lifecycle = LifecycleController::new(Arc::clone(&store));
        Self {
            store,
            identity,
            lifecycle,
        }
    }

    pub fn lifecycle(&self) -> &LifecycleController<S> {
        &self.lifecycle
    }

    /// Register a student or company profile together with its owned record.
    pub fn signup(&self, request: SignupRequest) -> Result<SignupOutcome, BoardError> {
        if request.role == Role::Admin {
            return Err(BoardError::forbidden(
                "administrator accounts cannot be self-registered",
            ));
        }
        let email = validate_email(&request.email)?;
        let full_name = required("full_name", &request.full_name)?;
        let company_name = match request.company_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => full_name.clone(),
        };

        let profile = self.new_profile(email, full_name, request.role)?;
        let account = match request.role {
            Role::Student => {
                let student = Student::empty(profile.id.clone());
                Account::Student(profile, student)
            }
            Role::Company => {
                let company = Company::pending(profile.id.clone(), company_name, Utc::now());
                Account::Company(profile, company)
            }
            Role::Admin => Account::Admin(profile),
        };

        // Revoked again when the insert fails.
        let token = self.identity.issue(account.profile())?;
        let profile = match self.register(account) {
            Ok(profile) => profile,
            Err(err) => {
                if let Err(revoke_err) = self.identity.revoke(&token) {
                    warn!(error = %revoke_err, "failed to revoke token of rejected signup");
                }
                return Err(err);
            }
        };
        info!(profile = %profile.id, role = profile.role.label(), "profile registered");
        Ok(SignupOutcome { profile, token })
    }

    /// Ensure an administrator profile exists for `email`, creating it when missing.
    pub fn bootstrap_admin(&self, email: &str, full_name: &str) -> Result<Profile, BoardError> {
        let email = validate_email(email)?;
        if let Some(existing) = self.store.find_profile_by_email(&email)? {
            if existing.role != Role::Admin {
                return Err(BoardError::validation(
                    "email",
                    format!("{email} is registered as a {}", existing.role.label()),
                ));
            }
            return Ok(existing);
        }

        let full_name = required("full_name", full_name)?;
        let profile = self.new_profile(email, full_name, Role::Admin)?;
        let profile = self.register(Account::Admin(profile))?;
        info!(profile = %profile.id, "administrator profile created");
        Ok(profile)
    }

    pub fn issue_session(&self, profile: &Profile) -> Result<String, BoardError> {
        Ok(self.identity.issue(profile)?)
    }

    /// Resolve an optional bearer token. A presented but unknown token is `Unauthorized`.
    pub fn authenticate(&self, token: Option<&str>) -> Result<Option<Session>, BoardError> {
        match token {
            None => Ok(None),
            Some(token) => self
                .identity
                .resolve(token)?
                .map(Some)
                .ok_or(BoardError::Unauthorized),
        }
    }

    /// End the session behind `token`. Unknown or missing tokens are `Unauthorized`.
    pub fn sign_out(&self, token: Option<&str>) -> Result<(), BoardError> {
        let session = self
            .authenticate(token)?
            .ok_or(BoardError::Unauthorized)?;
        if let Some(token) = token {
            self.identity.revoke(token)?;
        }
        info!(profile = %session.user_id, "session ended");
        Ok(())
    }

    pub fn me(&self, session: Option<&Session>) -> Result<Profile, BoardError> {
        let session = require_role(session, ANY_ROLE)?;
        self.store
            .fetch_profile(&session.user_id)?
            .ok_or_else(|| BoardError::not_found("profile", &session.user_id))
    }

    /// Student record joined with the owner's name and e-mail.
    ///
    /// Visible to the student, admins, and companies the student has applied to.
    pub fn get_student(
        &self,
        session: Option<&Session>,
        student_id: &ProfileId,
    ) -> Result<StudentView, BoardError> {
        let session = require_role(session, ANY_ROLE)?;
        if !session.owns(student_id)
            && !session.is_admin()
            && !self.is_applicant_of(session, student_id)?
        {
            return Err(BoardError::forbidden(
                "student profiles are visible to their owner, admins, and hiring companies",
            ));
        }

        let student = self
            .store
            .fetch_student(student_id)?
            .ok_or_else(|| BoardError::not_found("student", student_id))?;
        let profile = self.store.fetch_profile(student_id)?;
        debug!(student = %student_id, actor = %session.user_id, "student profile read");
        Ok(StudentView::new(student, profile.as_ref()))
    }

    pub fn update_student(
        &self,
        session: Option<&Session>,
        student_id: &ProfileId,
        update: &StudentUpdate,
    ) -> Result<Student, BoardError> {
        let session = require_role(session, &[Role::Student])?;
        if !session.owns(student_id) {
            return Err(BoardError::forbidden(
                "students may only edit their own profile",
            ));
        }

        let student = self
            .store
            .update_student(student_id, update)
            .map_err(missing("student", student_id))?;
        info!(student = %student_id, "student profile updated");
        Ok(student)
    }

    pub fn get_company(
        &self,
        session: Option<&Session>,
        company_id: &ProfileId,
    ) -> Result<CompanyView, BoardError> {
        let session = require_role(session, &[Role::Company, Role::Admin])?;
        if !session.owns(company_id) && !session.is_admin() {
            return Err(BoardError::forbidden(
                "company profiles are visible to their owner and admins",
            ));
        }

        let company = self
            .store
            .fetch_company(company_id)?
            .ok_or_else(|| BoardError::not_found("company", company_id))?;
        let profile = self.store.fetch_profile(company_id)?;
        Ok(CompanyView::new(company, profile.as_ref()))
    }

    /// All companies, newest first. Admin only.
    pub fn list_companies(&self, session: Option<&Session>) -> Result<Vec<CompanyView>, BoardError> {
        require_role(session, &[Role::Admin])?;
        let mut companies = self.store.list_companies()?;
        companies.sort_by(|a, b| (b.created_at, &b.id).cmp(&(a.created_at, &a.id)));

        companies
            .into_iter()
            .map(|company| -> Result<CompanyView, BoardError> {
                let profile = self.store.fetch_profile(&company.id)?;
                Ok(CompanyView::new(company, profile.as_ref()))
            })
            .collect()
    }

    /// Edit a company's own details. Verification status is not reachable from here.
    pub fn update_company(
        &self,
        session: Option<&Session>,
        company_id: &ProfileId,
        update: &CompanyUpdate,
    ) -> Result<Company, BoardError> {
        let session = require_role(session, &[Role::Company])?;
        if !session.owns(company_id) {
            return Err(BoardError::forbidden(
                "companies may only edit their own profile",
            ));
        }

        let company = self
            .store
            .update_company(company_id, update)
            .map_err(missing("company", company_id))?;
        info!(company = %company_id, "company profile updated");
        Ok(company)
    }

    pub fn review_company(
        &self,
        session: Option<&Session>,
        company_id: &ProfileId,
        decision: VerificationDecision,
    ) -> Result<Company, BoardError> {
        let session = session.ok_or(BoardError::Unauthorized)?;
        self.lifecycle.review_company(session, company_id, decision)
    }

    /// Job board listing, newest first, joined with company summaries.
    ///
    /// Anonymous callers and students see active jobs; companies additionally see their own
    /// closed postings; admins see everything.
    pub fn list_jobs(&self, session: Option<&Session>) -> Result<Vec<JobListing>, BoardError> {
        let query = match session {
            Some(session) if session.role != Role::Student => JobQuery::default(),
            _ => JobQuery {
                status: Some(JobStatus::Active),
                ..JobQuery::default()
            },
        };

        let mut jobs: Vec<Job> = self
            .store
            .list_jobs(&query)?
            .into_iter()
            .filter(|job| is_visible(session, job))
            .collect();
        sort_jobs(&mut jobs);

        let companies: HashMap<ProfileId, Company> = self
            .store
            .list_companies()?
            .into_iter()
            .map(|company| (company.id.clone(), company))
            .collect();

        debug!(count = jobs.len(), "jobs listed");
        Ok(jobs
            .into_iter()
            .map(|job| {
                let company = companies.get(&job.company_id).map(CompanySummary::from);
                JobListing { job, company }
            })
            .collect())
    }

    /// Single job with its company. Closed jobs read as missing to outsiders.
    pub fn get_job(
        &self,
        session: Option<&Session>,
        job_id: &JobId,
    ) -> Result<JobListing, BoardError> {
        let job = self
            .store
            .fetch_job(job_id)?
            .filter(|job| is_visible(session, job))
            .ok_or_else(|| BoardError::not_found("job", job_id))?;
        let company = self
            .store
            .fetch_company(&job.company_id)?
            .as_ref()
            .map(CompanySummary::from);
        Ok(JobListing { job, company })
    }

    pub fn list_company_jobs(
        &self,
        session: Option<&Session>,
        company_id: &ProfileId,
    ) -> Result<Vec<Job>, BoardError> {
        if self.store.fetch_company(company_id)?.is_none() {
            return Err(BoardError::not_found("company", company_id));
        }

        let privileged =
            session.map_or(false, |session| session.owns(company_id) || session.is_admin());
        let query = JobQuery {
            company_id: Some(company_id.clone()),
            status: (!privileged).then_some(JobStatus::Active),
        };

        let mut jobs = self.store.list_jobs(&query)?;
        sort_jobs(&mut jobs);
        Ok(jobs)
    }

    /// Post a job. The company's verification status is read at call time.
    pub fn create_job(
        &self,
        session: Option<&Session>,
        draft: JobDraft,
    ) -> Result<Job, BoardError> {
        let session = require_role(session, &[Role::Company])?;
        let company = self.lifecycle.ensure_can_post(session)?;
        let details = validate_job(draft)?;

        let job = Job::from_details(next_job_id(), company.id, details, Utc::now());
        let stored = self.store.insert_job(job)?;
        info!(job = %stored.id, company = %stored.company_id, "job posted");
        Ok(stored)
    }

    pub fn update_job(
        &self,
        session: Option<&Session>,
        job_id: &JobId,
        draft: JobDraft,
    ) -> Result<Job, BoardError> {
        let session = require_role(session, &[Role::Company])?;
        self.owned_job(session, job_id)?;
        let details = validate_job(draft)?;

        let job = self
            .store
            .update_job(job_id, details)
            .map_err(missing("job", job_id))?;
        info!(job = %job_id, "job updated");
        Ok(job)
    }

    pub fn close_job(
        &self,
        session: Option<&Session>,
        job_id: &JobId,
    ) -> Result<Job, BoardError> {
        let session = require_role(session, &[Role::Company])?;
        self.lifecycle.close_job(session, job_id)
    }

    /// Remove a job and every application to it.
    pub fn delete_job(&self, session: Option<&Session>, job_id: &JobId) -> Result<(), BoardError> {
        let session = require_role(session, &[Role::Company])?;
        self.owned_job(session, job_id)?;
        self.store
            .delete_job(job_id)
            .map_err(missing("job", job_id))?;
        info!(job = %job_id, "job deleted");
        Ok(())
    }

    /// Apply to an active job. One application per (job, student) pair.
    pub fn create_application(
        &self,
        session: Option<&Session>,
        draft: ApplicationDraft,
    ) -> Result<Application, BoardError> {
        let session = require_role(session, &[Role::Student])?;
        let job_id = draft
            .job_id
            .filter(|id| !id.as_str().trim().is_empty())
            .ok_or_else(|| BoardError::validation("job_id", "is required"))?;
        let student_id = draft
            .student_id
            .filter(|id| !id.as_str().trim().is_empty())
            .ok_or_else(|| BoardError::validation("student_id", "is required"))?;

        if !session.owns(&student_id) {
            return Err(BoardError::forbidden(
                "students may only apply on their own behalf",
            ));
        }

        let job = self
            .store
            .fetch_job(&job_id)?
            .ok_or_else(|| BoardError::not_found("job", &job_id))?;
        if job.status == JobStatus::Closed {
            return Err(BoardError::JobClosed(job_id));
        }
        if self.store.fetch_student(&student_id)?.is_none() {
            return Err(BoardError::not_found("student", &student_id));
        }

        let pair = ApplicationQuery::for_pair(&job_id, &student_id);
        if !self.store.list_applications(&pair)?.is_empty() {
            return Err(BoardError::DuplicateApplication { job_id, student_id });
        }

        let application = Application {
            id: next_application_id(),
            job_id: job_id.clone(),
            student_id: student_id.clone(),
            cover_letter: draft.cover_letter,
            status: ApplicationStatus::Pending,
            applied_at: Utc::now(),
        };

        let stored = match self.store.insert_application(application) {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => {
                return Err(BoardError::DuplicateApplication { job_id, student_id })
            }
            Err(RepositoryError::PreconditionFailed) => return Err(BoardError::JobClosed(job_id)),
            Err(other) => return Err(other.into()),
        };
        info!(application = %stored.id, job = %stored.job_id, student = %stored.student_id, "application submitted");
        Ok(stored)
    }

    pub fn has_applied(&self, session: Option<&Session>, job_id: &JobId) -> Result<bool, BoardError> {
        let session = require_role(session, &[Role::Student])?;
        let pair = ApplicationQuery::for_pair(job_id, &session.user_id);
        Ok(!self.store.list_applications(&pair)?.is_empty())
    }

    /// A student's applications with job and company details, newest first.
    pub fn list_student_applications(
        &self,
        session: Option<&Session>,
        student_id: &ProfileId,
    ) -> Result<Vec<StudentApplicationView>, BoardError> {
        let session = require_role(session, &[Role::Student, Role::Admin])?;
        if !session.owns(student_id) && !session.is_admin() {
            return Err(BoardError::forbidden(
                "students may only list their own applications",
            ));
        }

        let mut applications = self.store.list_applications(&ApplicationQuery {
            student_id: Some(student_id.clone()),
            ..ApplicationQuery::default()
        })?;
        sort_applications(&mut applications);

        applications
            .into_iter()
            .map(|application| -> Result<StudentApplicationView, BoardError> {
                let job = match self.store.fetch_job(&application.job_id)? {
                    Some(job) => {
                        let company_name = self
                            .store
                            .fetch_company(&job.company_id)?
                            .map(|company| company.company_name);
                        Some(AppliedJob {
                            id: job.id,
                            title: job.title,
                            location: job.location,
                            job_type: job.job_type,
                            salary_range: job.salary_range,
                            company_name,
                        })
                    }
                    None => None,
                };
                Ok(StudentApplicationView { application, job })
            })
            .collect()
    }

    /// Applicants for a job with their student profiles, newest first.
    pub fn list_job_applications(
        &self,
        session: Option<&Session>,
        job_id: &JobId,
    ) -> Result<Vec<ApplicantView>, BoardError> {
        let session = require_role(session, &[Role::Company, Role::Admin])?;
        let job = self
            .store
            .fetch_job(job_id)?
            .ok_or_else(|| BoardError::not_found("job", job_id))?;
        if !session.owns(&job.company_id) && !session.is_admin() {
            return Err(BoardError::forbidden(
                "only the company that posted the job may list its applicants",
            ));
        }

        let mut applications = self.store.list_applications(&ApplicationQuery {
            job_id: Some(job_id.clone()),
            ..ApplicationQuery::default()
        })?;
        sort_applications(&mut applications);

        applications
            .into_iter()
            .map(|application| -> Result<ApplicantView, BoardError> {
                let student = match self.store.fetch_student(&application.student_id)? {
                    Some(student) => {
                        let profile = self.store.fetch_profile(&student.id)?;
                        Some(StudentView::new(student, profile.as_ref()))
                    }
                    None => None,
                };
                Ok(ApplicantView {
                    application,
                    student,
                })
            })
            .collect()
    }

    pub fn set_application_status(
        &self,
        session: Option<&Session>,
        application_id: &ApplicationId,
        decision: ApplicationDecision,
    ) -> Result<Application, BoardError> {
        let session = session.ok_or(BoardError::Unauthorized)?;
        self.lifecycle
            .decide_application(session, application_id, decision)
    }

    fn new_profile(
        &self,
        email: String,
        full_name: String,
        role: Role,
    ) -> Result<Profile, BoardError> {
        if self.store.find_profile_by_email(&email)?.is_some() {
            return Err(BoardError::validation("email", "is already registered"));
        }
        Ok(Profile {
            id: next_profile_id(),
            email,
            full_name,
            role,
        })
    }

    fn register(&self, account: Account) -> Result<Profile, BoardError> {
        match self.store.insert_account(account) {
            Ok(account) => Ok(account.into_profile()),
            Err(RepositoryError::Conflict) => {
                Err(BoardError::validation("email", "is already registered"))
            }
            Err(other) => Err(other.into()),
        }
    }

    fn owned_job(&self, session: &Session, job_id: &JobId) -> Result<Job, BoardError> {
        let job = self
            .store
            .fetch_job(job_id)?
            .ok_or_else(|| BoardError::not_found("job", job_id))?;
        if !session.owns(&job.company_id) {
            return Err(BoardError::forbidden(
                "only the company that posted the job may modify it",
            ));
        }
        Ok(job)
    }

    fn is_applicant_of(&self, session: &Session, student_id: &ProfileId) -> Result<bool, BoardError> {
        if session.role != Role::Company {
            return Ok(false);
        }
        let applications = self.store.list_applications(&ApplicationQuery {
            student_id: Some(student_id.clone()),
            ..ApplicationQuery::default()
        })?;
        for application in applications {
            if let Some(job) = self.store.fetch_job(&application.job_id)? {
                if session.owns(&job.company_id) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

fn is_visible(session: Option<&Session>, job: &Job) -> bool {
    job.status == JobStatus::Active
        || session.map_or(false, |session| {
            session.is_admin() || session.owns(&job.company_id)
        })
}

fn sort_jobs(jobs: &mut [Job]) {
    jobs.sort_by(|a, b| (b.created_at, &b.id).cmp(&(a.created_at, &a.id)));
}

fn sort_applications(applications: &mut [Application]) {
    applications.sort_by(|a, b| (b.applied_at, &b.id).cmp(&(a.applied_at, &a.id)));
}

fn missing<'a, T: ToString>(
    entity: &'static str,
    id: &'a T,
) -> impl FnOnce(RepositoryError) -> BoardError + 'a {
    move |err| match err {
        RepositoryError::NotFound => BoardError::not_found(entity, id.to_string()),
        other => other.into(),
    }
}

fn required(field: &'static str, value: &str) -> Result<String, BoardError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BoardError::validation(field, "is required"));
    }
    Ok(trimmed.to_string())
}

fn validate_email(raw: &str) -> Result<String, BoardError> {
    let email = required("email", raw)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(BoardError::validation("email", "must be an e-mail address")),
    }
}

fn validate_job(draft: JobDraft) -> Result<JobDetails, BoardError> {
    let title = required("title", &draft.title)?;
    let location = required("location", &draft.location)?;
    let job_type = draft
        .job_type
        .ok_or_else(|| BoardError::validation("job_type", "is required"))?;

    Ok(JobDetails {
        title,
        description: draft.description.trim().to_string(),
        requirements: draft.requirements.trim().to_string(),
        location,
        job_type,
        salary_range: draft.salary_range.trim().to_string(),
    })
}
