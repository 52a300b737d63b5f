use serde::Serialize;

use super::domain::{Application, Company, Job, JobId, JobType, Profile, ProfileId, Student};
use super::error::BoardError;

/// Company fields shown alongside a job posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanySummary {
    pub id: ProfileId,
    pub company_name: String,
    pub location: String,
    pub description: String,
    pub website: String,
}

impl From<&Company> for CompanySummary {
    fn from(company: &Company) -> Self {
        Self {
            id: company.id.clone(),
            company_name: company.company_name.clone(),
            location: company.location.clone(),
            description: company.description.clone(),
            website: company.website.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobListing {
    #[serde(flatten)]
    pub job: Job,
    pub company: Option<CompanySummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentView {
    #[serde(flatten)]
    pub student: Student,
    pub full_name: String,
    pub email: String,
}

impl StudentView {
    pub fn new(student: Student, profile: Option<&Profile>) -> Self {
        let (full_name, email) = contact(profile);
        Self {
            student,
            full_name,
            email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyView {
    #[serde(flatten)]
    pub company: Company,
    pub full_name: String,
    pub email: String,
}

impl CompanyView {
    pub fn new(company: Company, profile: Option<&Profile>) -> Self {
        let (full_name, email) = contact(profile);
        Self {
            company,
            full_name,
            email,
        }
    }
}

fn contact(profile: Option<&Profile>) -> (String, String) {
    profile
        .map(|profile| (profile.full_name.clone(), profile.email.clone()))
        .unwrap_or_default()
}

/// Job fields a student sees next to each of their applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedJob {
    pub id: JobId,
    pub title: String,
    pub location: String,
    pub job_type: JobType,
    pub salary_range: String,
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub job: Option<AppliedJob>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicantView {
    #[serde(flatten)]
    pub application: Application,
    pub student: Option<StudentView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// `(data, error)` pair handed to the view layer; `data` is set only when `error` is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    pub error: Option<ErrorBody>,
}

impl<T> Envelope<T> {
    pub fn from_result(result: Result<T, &BoardError>) -> Self {
        match result {
            Ok(data) => Self {
                data: Some(data),
                error: None,
            },
            Err(error) => Self {
                data: None,
                error: Some(ErrorBody {
                    code: error.code(),
                    message: error.to_string(),
                }),
            },
        }
    }
}
