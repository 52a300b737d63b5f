use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier shared by a profile and the student or company row it owns.
    ProfileId
);
string_id!(
    /// Identifier for a job posting.
    JobId
);
string_id!(
    /// Identifier for a student's application to a job.
    ApplicationId
);

/// Role assigned at signup. There is no re-assignment path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Company,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Company => "company",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

/// A profile together with the role record registered alongside it. Stored as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Account {
    Student(Profile, Student),
    Company(Profile, Company),
    Admin(Profile),
}

impl Account {
    pub fn profile(&self) -> &Profile {
        match self {
            Account::Student(profile, _)
            | Account::Company(profile, _)
            | Account::Admin(profile) => profile,
        }
    }

    pub fn into_profile(self) -> Profile {
        match self {
            Account::Student(profile, _)
            | Account::Company(profile, _)
            | Account::Admin(profile) => profile,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: ProfileId,
    pub degree: String,
    pub skills: Vec<String>,
    pub phone: String,
    pub bio: String,
    pub resume_url: String,
}

impl Student {
    pub fn empty(id: ProfileId) -> Self {
        Self {
            id,
            degree: String::new(),
            skills: Vec::new(),
            phone: String::new(),
            bio: String::new(),
            resume_url: String::new(),
        }
    }
}

/// Admin-controlled trust flag gating a company's ability to post jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, VerificationStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: ProfileId,
    pub company_name: String,
    pub gst_number: String,
    pub cin_number: String,
    pub website: String,
    pub description: String,
    pub location: String,
    pub phone: String,
    pub verification_status: VerificationStatus,
    pub created_at: DateTime<Utc>,
}

impl Company {
    pub fn pending(id: ProfileId, company_name: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            company_name,
            gst_number: String::new(),
            cin_number: String::new(),
            website: String::new(),
            description: String::new(),
            location: String::new(),
            phone: String::new(),
            verification_status: VerificationStatus::Pending,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Internship,
}

impl JobType {
    pub const fn label(self) -> &'static str {
        match self {
            JobType::FullTime => "full-time",
            JobType::PartTime => "part-time",
            JobType::Internship => "internship",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Active,
    Closed,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub company_id: ProfileId,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub location: String,
    pub job_type: JobType,
    pub salary_range: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn from_details(
        id: JobId,
        company_id: ProfileId,
        details: JobDetails,
        created_at: DateTime<Utc>,
    ) -> Self {
        let JobDetails {
            title,
            description,
            requirements,
            location,
            job_type,
            salary_range,
        } = details;

        Self {
            id,
            company_id,
            title,
            description,
            requirements,
            location,
            job_type,
            salary_range,
            status: JobStatus::Active,
            created_at,
        }
    }

    pub fn apply_details(&mut self, details: JobDetails) {
        self.title = details.title;
        self.description = details.description;
        self.requirements = details.requirements;
        self.location = details.location;
        self.job_type = details.job_type;
        self.salary_range = details.salary_range;
    }
}

/// Company-controlled status of a student's application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Shortlisted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub student_id: ProfileId,
    pub cover_letter: String,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}

/// Signup payload. Admin profiles are seeded, never self-registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default)]
    pub company_name: Option<String>,
}

/// Raw job form as submitted by a company; validated into [`JobDetails`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobDraft {
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub location: String,
    pub job_type: Option<JobType>,
    pub salary_range: String,
}

/// Editable job fields after required-field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDetails {
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub location: String,
    pub job_type: JobType,
    pub salary_range: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationDraft {
    pub job_id: Option<JobId>,
    pub student_id: Option<ProfileId>,
    pub cover_letter: String,
}

/// Partial update of a student's own record. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentUpdate {
    pub degree: Option<String>,
    pub skills: Option<Vec<String>>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub resume_url: Option<String>,
}

impl StudentUpdate {
    pub fn apply_to(&self, student: &mut Student) {
        if let Some(degree) = &self.degree {
            student.degree = degree.clone();
        }
        if let Some(skills) = &self.skills {
            student.skills = skills
                .iter()
                .map(|skill| skill.trim().to_string())
                .filter(|skill| !skill.is_empty())
                .collect();
        }
        if let Some(phone) = &self.phone {
            student.phone = phone.clone();
        }
        if let Some(bio) = &self.bio {
            student.bio = bio.clone();
        }
        if let Some(resume_url) = &self.resume_url {
            student.resume_url = resume_url.clone();
        }
    }
}

/// Partial update of a company's own record. Verification status is not editable here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyUpdate {
    pub company_name: Option<String>,
    pub gst_number: Option<String>,
    pub cin_number: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
}

impl CompanyUpdate {
    pub fn apply_to(&self, company: &mut Company) {
        let fields = [
            (&self.company_name, &mut company.company_name),
            (&self.gst_number, &mut company.gst_number),
            (&self.cin_number, &mut company.cin_number),
            (&self.website, &mut company.website),
            (&self.description, &mut company.description),
            (&self.location, &mut company.location),
            (&self.phone, &mut company.phone),
        ];
        for (update, target) in fields {
            if let Some(value) = update {
                *target = value.clone();
            }
        }
    }
}

/// Split a comma separated skill list, trimming entries and dropping blanks.
pub fn parse_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|skill| !skill.is_empty())
        .map(str::to_string)
        .collect()
}
