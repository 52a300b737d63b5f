//! In-process store and session collaborators used by the demo service and tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use super::domain::{
    Account, Application, ApplicationId, ApplicationStatus, Company, CompanyUpdate, Job,
    JobDetails, JobId, JobStatus, Profile, ProfileId, Student, StudentUpdate, VerificationStatus,
};
use super::identity::{IdentityProvider, Session};
use super::repository::{ApplicationQuery, BoardStore, JobQuery, RepositoryError};

#[derive(Debug, Default)]
struct Tables {
    profiles: BTreeMap<ProfileId, Profile>,
    students: BTreeMap<ProfileId, Student>,
    companies: BTreeMap<ProfileId, Company>,
    jobs: BTreeMap<JobId, Job>,
    applications: BTreeMap<ApplicationId, Application>,
}

/// Single-lock store so every conditional update is atomic with its status check.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBoardStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryBoardStore {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }
}

impl BoardStore for InMemoryBoardStore {
    fn insert_account(&self, account: Account) -> Result<Account, RepositoryError> {
        let mut tables = self.tables()?;
        let profile = account.profile();
        let email_taken = tables
            .profiles
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&profile.email));
        if email_taken || tables.profiles.contains_key(&profile.id) {
            return Err(RepositoryError::Conflict);
        }

        match &account {
            Account::Student(profile, student) => {
                if student.id != profile.id || tables.students.contains_key(&student.id) {
                    return Err(RepositoryError::Conflict);
                }
                tables.students.insert(student.id.clone(), student.clone());
            }
            Account::Company(profile, company) => {
                if company.id != profile.id || tables.companies.contains_key(&company.id) {
                    return Err(RepositoryError::Conflict);
                }
                tables.companies.insert(company.id.clone(), company.clone());
            }
            Account::Admin(_) => {}
        }
        tables.profiles.insert(profile.id.clone(), profile.clone());
        Ok(account)
    }

    fn fetch_profile(&self, id: &ProfileId) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.tables()?.profiles.get(id).cloned())
    }

    fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>, RepositoryError> {
        Ok(self
            .tables()?
            .profiles
            .values()
            .find(|profile| profile.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn fetch_student(&self, id: &ProfileId) -> Result<Option<Student>, RepositoryError> {
        Ok(self.tables()?.students.get(id).cloned())
    }

    fn update_student(
        &self,
        id: &ProfileId,
        update: &StudentUpdate,
    ) -> Result<Student, RepositoryError> {
        let mut tables = self.tables()?;
        let student = tables
            .students
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        update.apply_to(student);
        Ok(student.clone())
    }

    fn fetch_company(&self, id: &ProfileId) -> Result<Option<Company>, RepositoryError> {
        Ok(self.tables()?.companies.get(id).cloned())
    }

    fn list_companies(&self) -> Result<Vec<Company>, RepositoryError> {
        Ok(self.tables()?.companies.values().cloned().collect())
    }

    fn update_company(
        &self,
        id: &ProfileId,
        update: &CompanyUpdate,
    ) -> Result<Company, RepositoryError> {
        let mut tables = self.tables()?;
        let company = tables
            .companies
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        update.apply_to(company);
        Ok(company.clone())
    }

    fn update_verification(
        &self,
        id: &ProfileId,
        expected: VerificationStatus,
        next: VerificationStatus,
    ) -> Result<Option<Company>, RepositoryError> {
        let mut tables = self.tables()?;
        Ok(tables
            .companies
            .get_mut(id)
            .filter(|company| company.verification_status == expected)
            .map(|company| {
                company.verification_status = next;
                company.clone()
            }))
    }

    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.companies.contains_key(&job.company_id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.jobs.contains_key(&job.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.tables()?.jobs.get(id).cloned())
    }

    fn list_jobs(&self, query: &JobQuery) -> Result<Vec<Job>, RepositoryError> {
        Ok(self
            .tables()?
            .jobs
            .values()
            .filter(|job| query.matches(job))
            .cloned()
            .collect())
    }

    fn update_job(&self, id: &JobId, details: JobDetails) -> Result<Job, RepositoryError> {
        let mut tables = self.tables()?;
        let job = tables.jobs.get_mut(id).ok_or(RepositoryError::NotFound)?;
        job.apply_details(details);
        Ok(job.clone())
    }

    fn update_job_status(
        &self,
        id: &JobId,
        expected: JobStatus,
        next: JobStatus,
    ) -> Result<Option<Job>, RepositoryError> {
        let mut tables = self.tables()?;
        Ok(tables
            .jobs
            .get_mut(id)
            .filter(|job| job.status == expected)
            .map(|job| {
                job.status = next;
                job.clone()
            }))
    }

    fn delete_job(&self, id: &JobId) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        if tables.jobs.remove(id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        tables
            .applications
            .retain(|_, application| &application.job_id != id);
        Ok(())
    }

    fn insert_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        let mut tables = self.tables()?;
        let job_status = tables
            .jobs
            .get(&application.job_id)
            .map(|job| job.status)
            .ok_or(RepositoryError::NotFound)?;
        if !tables.students.contains_key(&application.student_id) {
            return Err(RepositoryError::NotFound);
        }
        if job_status != JobStatus::Active {
            return Err(RepositoryError::PreconditionFailed);
        }
        let pair = ApplicationQuery::for_pair(&application.job_id, &application.student_id);
        if tables.applications.contains_key(&application.id)
            || tables.applications.values().any(|existing| pair.matches(existing))
        {
            return Err(RepositoryError::Conflict);
        }
        tables
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(self.tables()?.applications.get(id).cloned())
    }

    fn list_applications(
        &self,
        query: &ApplicationQuery,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .tables()?
            .applications
            .values()
            .filter(|application| query.matches(application))
            .cloned()
            .collect())
    }

    fn update_application_status(
        &self,
        id: &ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<Option<Application>, RepositoryError> {
        let mut guard = self.tables()?;
        let tables = &mut *guard;
        let Some(application) = tables
            .applications
            .get_mut(id)
            .filter(|application| application.status == expected)
        else {
            return Ok(None);
        };

        let job_active = tables
            .jobs
            .get(&application.job_id)
            .map_or(false, |job| job.status == JobStatus::Active);
        if !job_active {
            return Err(RepositoryError::PreconditionFailed);
        }

        application.status = next;
        Ok(Some(application.clone()))
    }
}

/// Bearer-token sessions held in memory. Tokens are 256 bits of random hex carrying no
/// profile data.
#[derive(Debug, Default, Clone)]
pub struct InMemorySessions {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl InMemorySessions {
    fn sessions(&self) -> Result<MutexGuard<'_, HashMap<String, Session>>, RepositoryError> {
        self.sessions
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session lock poisoned".to_string()))
    }

    /// Register a caller-chosen token, e.g. the configured admin token.
    pub fn insert_token(&self, token: String, session: Session) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions()?;
        if sessions.contains_key(&token) {
            return Err(RepositoryError::Conflict);
        }
        sessions.insert(token, session);
        Ok(())
    }
}

impl IdentityProvider for InMemorySessions {
    fn issue(&self, profile: &Profile) -> Result<String, RepositoryError> {
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        self.sessions()?.insert(token.clone(), Session::from(profile));
        Ok(token)
    }

    fn resolve(&self, token: &str) -> Result<Option<Session>, RepositoryError> {
        Ok(self.sessions()?.get(token).cloned())
    }

    fn revoke(&self, token: &str) -> Result<(), RepositoryError> {
        self.sessions()?.remove(token);
        Ok(())
    }
}
