use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::board::domain::{
    Account, Application, ApplicationDraft, ApplicationId, ApplicationStatus, Company,
    CompanyUpdate, Job, JobDetails, JobDraft, JobId, JobStatus, JobType, Profile, ProfileId,
    Role, SignupRequest, Student, StudentUpdate, VerificationStatus,
};
use crate::board::identity::Session;
use crate::board::lifecycle::VerificationDecision;
use crate::board::memory::{InMemoryBoardStore, InMemorySessions};
use crate::board::repository::{ApplicationQuery, BoardStore, JobQuery, RepositoryError};
use crate::board::{board_router, BoardService};

pub(super) type Service = BoardService<InMemoryBoardStore, InMemorySessions>;
pub(super) type Board<S> = BoardService<S, InMemorySessions>;

pub(super) fn build_service() -> (Service, Arc<InMemoryBoardStore>, Arc<InMemorySessions>) {
    let store = Arc::new(InMemoryBoardStore::default());
    let sessions = Arc::new(InMemorySessions::default());
    let service = BoardService::new(store.clone(), sessions.clone());
    (service, store, sessions)
}

pub(super) fn build_stale_service() -> (Board<StaleReadStore>, Arc<StaleReadStore>) {
    let store = Arc::new(StaleReadStore::default());
    let service = BoardService::new(store.clone(), Arc::new(InMemorySessions::default()));
    (service, store)
}

pub(super) fn admin<S: BoardStore + 'static>(service: &Board<S>) -> (Session, String) {
    let profile = service
        .bootstrap_admin("admin@getjobandgo.test", "Board Admin")
        .expect("admin seeds");
    let token = service.issue_session(&profile).expect("admin session");
    (Session::from(&profile), token)
}

pub(super) fn register<S: BoardStore + 'static>(
    service: &Board<S>,
    role: Role,
    name: &str,
) -> (Session, String) {
    let outcome = service
        .signup(SignupRequest {
            email: format!("{name}@example.com"),
            full_name: name.to_string(),
            role,
            company_name: None,
        })
        .expect("signup succeeds");
    (Session::from(&outcome.profile), outcome.token)
}

pub(super) fn approved_company<S: BoardStore + 'static>(
    service: &Board<S>,
    admin: &Session,
    name: &str,
) -> Session {
    approved_company_with_token(service, admin, name).0
}

pub(super) fn approved_company_with_token<S: BoardStore + 'static>(
    service: &Board<S>,
    admin: &Session,
    name: &str,
) -> (Session, String) {
    let (company, token) = register(service, Role::Company, name);
    service
        .review_company(Some(admin), &company.user_id, VerificationDecision::Approve)
        .expect("admin approves company");
    (company, token)
}

pub(super) fn job_draft(title: &str) -> JobDraft {
    JobDraft {
        title: title.to_string(),
        description: "Build and run the hiring APIs".to_string(),
        requirements: "Rust, SQL".to_string(),
        location: "Chennai".to_string(),
        job_type: Some(JobType::FullTime),
        salary_range: "6-9 LPA".to_string(),
    }
}

pub(super) fn posted_job<S: BoardStore + 'static>(
    service: &Board<S>,
    company: &Session,
    title: &str,
) -> Job {
    service
        .create_job(Some(company), job_draft(title))
        .expect("approved company posts job")
}

pub(super) fn application_draft(job: &Job, student: &Session) -> ApplicationDraft {
    ApplicationDraft {
        job_id: Some(job.id.clone()),
        student_id: Some(student.user_id.clone()),
        cover_letter: "I would love to join.".to_string(),
    }
}

pub(super) fn applied<S: BoardStore + 'static>(
    service: &Board<S>,
    job: &Job,
    student: &Session,
) -> Application {
    service
        .create_application(Some(student), application_draft(job, student))
        .expect("student applies")
}

pub(super) fn job_details(title: &str) -> JobDetails {
    JobDetails {
        title: title.to_string(),
        description: String::new(),
        requirements: String::new(),
        location: "Coimbatore".to_string(),
        job_type: JobType::Internship,
        salary_range: String::new(),
    }
}

pub(super) fn router_with_service(service: Service) -> axum::Router {
    board_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

/// Store whose every call fails, for exercising error propagation.
pub(super) struct UnavailableStore;

impl BoardStore for UnavailableStore {
    fn insert_account(&self, _account: Account) -> Result<Account, RepositoryError> {
        offline()
    }

    fn fetch_profile(&self, _id: &ProfileId) -> Result<Option<Profile>, RepositoryError> {
        offline()
    }

    fn find_profile_by_email(&self, _email: &str) -> Result<Option<Profile>, RepositoryError> {
        offline()
    }

    fn fetch_student(&self, _id: &ProfileId) -> Result<Option<Student>, RepositoryError> {
        offline()
    }

    fn update_student(
        &self,
        _id: &ProfileId,
        _update: &StudentUpdate,
    ) -> Result<Student, RepositoryError> {
        offline()
    }

    fn fetch_company(&self, _id: &ProfileId) -> Result<Option<Company>, RepositoryError> {
        offline()
    }

    fn list_companies(&self) -> Result<Vec<Company>, RepositoryError> {
        offline()
    }

    fn update_company(
        &self,
        _id: &ProfileId,
        _update: &CompanyUpdate,
    ) -> Result<Company, RepositoryError> {
        offline()
    }

    fn update_verification(
        &self,
        _id: &ProfileId,
        _expected: VerificationStatus,
        _next: VerificationStatus,
    ) -> Result<Option<Company>, RepositoryError> {
        offline()
    }

    fn insert_job(&self, _job: Job) -> Result<Job, RepositoryError> {
        offline()
    }

    fn fetch_job(&self, _id: &JobId) -> Result<Option<Job>, RepositoryError> {
        offline()
    }

    fn list_jobs(&self, _query: &JobQuery) -> Result<Vec<Job>, RepositoryError> {
        offline()
    }

    fn update_job(&self, _id: &JobId, _details: JobDetails) -> Result<Job, RepositoryError> {
        offline()
    }

    fn update_job_status(
        &self,
        _id: &JobId,
        _expected: JobStatus,
        _next: JobStatus,
    ) -> Result<Option<Job>, RepositoryError> {
        offline()
    }

    fn delete_job(&self, _id: &JobId) -> Result<(), RepositoryError> {
        offline()
    }

    fn insert_application(
        &self,
        _application: Application,
    ) -> Result<Application, RepositoryError> {
        offline()
    }

    fn fetch_application(
        &self,
        _id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        offline()
    }

    fn list_applications(
        &self,
        _query: &ApplicationQuery,
    ) -> Result<Vec<Application>, RepositoryError> {
        offline()
    }

    fn update_application_status(
        &self,
        _id: &ApplicationId,
        _expected: ApplicationStatus,
        _next: ApplicationStatus,
    ) -> Result<Option<Application>, RepositoryError> {
        offline()
    }
}

fn take<T>(slot: &Mutex<Option<T>>) -> Option<T> {
    slot.lock().expect("stale slot poisoned").take()
}

fn arm<T>(slot: &Mutex<Option<T>>, value: T) {
    *slot.lock().expect("stale slot poisoned") = Some(value);
}

/// Delegates to an in-memory store but answers the next armed read with a stale row, as if
/// another writer committed between a caller's read and its write.
#[derive(Default)]
pub(super) struct StaleReadStore {
    pub(super) inner: InMemoryBoardStore,
    company: Mutex<Option<Company>>,
    job: Mutex<Option<Job>>,
    application: Mutex<Option<Application>>,
    hide_applications: Mutex<Option<()>>,
    hide_emails: Mutex<Option<()>>,
}

impl StaleReadStore {
    pub(super) fn serve_stale_company(&self, company: Company) {
        arm(&self.company, company);
    }

    pub(super) fn serve_stale_job(&self, job: Job) {
        arm(&self.job, job);
    }

    pub(super) fn serve_stale_application(&self, application: Application) {
        arm(&self.application, application);
    }

    /// The next `list_applications` call sees an empty table.
    pub(super) fn hide_applications_once(&self) {
        arm(&self.hide_applications, ());
    }

    /// The next `find_profile_by_email` call finds nothing.
    pub(super) fn hide_emails_once(&self) {
        arm(&self.hide_emails, ());
    }
}

impl BoardStore for StaleReadStore {
    fn insert_account(&self, account: Account) -> Result<Account, RepositoryError> {
        self.inner.insert_account(account)
    }

    fn fetch_profile(&self, id: &ProfileId) -> Result<Option<Profile>, RepositoryError> {
        self.inner.fetch_profile(id)
    }

    fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>, RepositoryError> {
        match take(&self.hide_emails) {
            Some(()) => Ok(None),
            None => self.inner.find_profile_by_email(email),
        }
    }

    fn fetch_student(&self, id: &ProfileId) -> Result<Option<Student>, RepositoryError> {
        self.inner.fetch_student(id)
    }

    fn update_student(
        &self,
        id: &ProfileId,
        update: &StudentUpdate,
    ) -> Result<Student, RepositoryError> {
        self.inner.update_student(id, update)
    }

    fn fetch_company(&self, id: &ProfileId) -> Result<Option<Company>, RepositoryError> {
        match take(&self.company) {
            Some(company) => Ok(Some(company)),
            None => self.inner.fetch_company(id),
        }
    }

    fn list_companies(&self) -> Result<Vec<Company>, RepositoryError> {
        self.inner.list_companies()
    }

    fn update_company(
        &self,
        id: &ProfileId,
        update: &CompanyUpdate,
    ) -> Result<Company, RepositoryError> {
        self.inner.update_company(id, update)
    }

    fn update_verification(
        &self,
        id: &ProfileId,
        expected: VerificationStatus,
        next: VerificationStatus,
    ) -> Result<Option<Company>, RepositoryError> {
        self.inner.update_verification(id, expected, next)
    }

    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError> {
        self.inner.insert_job(job)
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        match take(&self.job) {
            Some(job) => Ok(Some(job)),
            None => self.inner.fetch_job(id),
        }
    }

    fn list_jobs(&self, query: &JobQuery) -> Result<Vec<Job>, RepositoryError> {
        self.inner.list_jobs(query)
    }

    fn update_job(&self, id: &JobId, details: JobDetails) -> Result<Job, RepositoryError> {
        self.inner.update_job(id, details)
    }

    fn update_job_status(
        &self,
        id: &JobId,
        expected: JobStatus,
        next: JobStatus,
    ) -> Result<Option<Job>, RepositoryError> {
        self.inner.update_job_status(id, expected, next)
    }

    fn delete_job(&self, id: &JobId) -> Result<(), RepositoryError> {
        self.inner.delete_job(id)
    }

    fn insert_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        self.inner.insert_application(application)
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        match take(&self.application) {
            Some(application) => Ok(Some(application)),
            None => self.inner.fetch_application(id),
        }
    }

    fn list_applications(
        &self,
        query: &ApplicationQuery,
    ) -> Result<Vec<Application>, RepositoryError> {
        match take(&self.hide_applications) {
            Some(()) => Ok(Vec::new()),
            None => self.inner.list_applications(query),
        }
    }

    fn update_application_status(
        &self,
        id: &ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<Option<Application>, RepositoryError> {
        self.inner.update_application_status(id, expected, next)
    }
}
