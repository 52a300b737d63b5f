use super::domain::{
    Account, Application, ApplicationId, ApplicationStatus, Company, CompanyUpdate, Job,
    JobDetails, JobId, JobStatus, Profile, ProfileId, Student, StudentUpdate, VerificationStatus,
};

/// Equality filters over the `jobs` collection. `None` matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobQuery {
    pub company_id: Option<ProfileId>,
    pub status: Option<JobStatus>,
}

impl JobQuery {
    pub fn matches(&self, job: &Job) -> bool {
        self.company_id
            .as_ref()
            .map_or(true, |company_id| &job.company_id == company_id)
            && self.status.map_or(true, |status| job.status == status)
    }
}

/// Equality filters over the `applications` collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationQuery {
    pub job_id: Option<JobId>,
    pub student_id: Option<ProfileId>,
}

impl ApplicationQuery {
    pub fn for_pair(job_id: &JobId, student_id: &ProfileId) -> Self {
        Self {
            job_id: Some(job_id.clone()),
            student_id: Some(student_id.clone()),
        }
    }

    pub fn matches(&self, application: &Application) -> bool {
        self.job_id
            .as_ref()
            .map_or(true, |job_id| &application.job_id == job_id)
            && self
                .student_id
                .as_ref()
                .map_or(true, |student_id| &application.student_id == student_id)
    }
}

/// Persistence collaborator exposing table-like collections.
///
/// Updates return the updated row. Status changes are conditional: they only apply when the
/// stored status still equals `expected`, and return `Ok(None)` when no row matched.
pub trait BoardStore: Send + Sync {
    /// Inserts a profile and its role record together; `Conflict` when the e-mail or id is
    /// taken or the record does not belong to the profile. Nothing is stored on error.
    fn insert_account(&self, account: Account) -> Result<Account, RepositoryError>;
    fn fetch_profile(&self, id: &ProfileId) -> Result<Option<Profile>, RepositoryError>;
    fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>, RepositoryError>;

    fn fetch_student(&self, id: &ProfileId) -> Result<Option<Student>, RepositoryError>;
    fn update_student(
        &self,
        id: &ProfileId,
        update: &StudentUpdate,
    ) -> Result<Student, RepositoryError>;

    fn fetch_company(&self, id: &ProfileId) -> Result<Option<Company>, RepositoryError>;
    fn list_companies(&self) -> Result<Vec<Company>, RepositoryError>;
    fn update_company(
        &self,
        id: &ProfileId,
        update: &CompanyUpdate,
    ) -> Result<Company, RepositoryError>;
    fn update_verification(
        &self,
        id: &ProfileId,
        expected: VerificationStatus,
        next: VerificationStatus,
    ) -> Result<Option<Company>, RepositoryError>;

    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError>;
    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    fn list_jobs(&self, query: &JobQuery) -> Result<Vec<Job>, RepositoryError>;
    fn update_job(&self, id: &JobId, details: JobDetails) -> Result<Job, RepositoryError>;
    fn update_job_status(
        &self,
        id: &JobId,
        expected: JobStatus,
        next: JobStatus,
    ) -> Result<Option<Job>, RepositoryError>;
    /// Removes the job together with its applications.
    fn delete_job(&self, id: &JobId) -> Result<(), RepositoryError>;

    /// Inserts an application; `Conflict` when the id or the (job, student) pair exists and
    /// `PreconditionFailed` when the job is no longer active.
    fn insert_application(&self, application: Application)
        -> Result<Application, RepositoryError>;
    fn fetch_application(&self, id: &ApplicationId)
        -> Result<Option<Application>, RepositoryError>;
    fn list_applications(
        &self,
        query: &ApplicationQuery,
    ) -> Result<Vec<Application>, RepositoryError>;
    /// `PreconditionFailed` when the application's job is no longer active.
    fn update_application_status(
        &self,
        id: &ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<Option<Application>, RepositoryError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("a related record no longer permits this change")]
    PreconditionFailed,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn application(job: &str, student: &str) -> Application {
        Application {
            id: ApplicationId::from("app-1"),
            job_id: JobId::from(job),
            student_id: ProfileId::from(student),
            cover_letter: String::new(),
            status: ApplicationStatus::Pending,
            applied_at: Utc::now(),
        }
    }

    #[test]
    fn empty_application_query_matches_everything() {
        assert!(ApplicationQuery::default().matches(&application("job-1", "stu-1")));
    }

    #[test]
    fn pair_query_requires_both_ids() {
        let query = ApplicationQuery::for_pair(&JobId::from("job-1"), &ProfileId::from("stu-1"));
        assert!(query.matches(&application("job-1", "stu-1")));
        assert!(!query.matches(&application("job-1", "stu-2")));
        assert!(!query.matches(&application("job-2", "stu-1")));
    }
}
