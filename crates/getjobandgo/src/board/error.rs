use super::domain::{JobId, ProfileId};
use super::repository::RepositoryError;

/// Typed failure returned by every board operation. Any error leaves stored state unchanged.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("authentication required")]
    Unauthorized,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("student {student_id} has already applied to job {job_id}")]
    DuplicateApplication { job_id: JobId, student_id: ProfileId },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("{entity} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: &'static str,
        to: &'static str,
    },
    #[error("job {0} is closed")]
    JobClosed(JobId),
    #[error("{entity} {id} was modified concurrently")]
    ConcurrentModification { entity: &'static str, id: String },
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

impl BoardError {
    pub(crate) fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn conflict(entity: &'static str, id: impl ToString) -> Self {
        Self::ConcurrentModification {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable code for response envelopes.
    pub const fn code(&self) -> &'static str {
        match self {
            BoardError::Unauthorized => "unauthorized",
            BoardError::Forbidden(_) => "forbidden",
            BoardError::Validation { .. } => "validation_error",
            BoardError::DuplicateApplication { .. } => "duplicate_application",
            BoardError::NotFound { .. } => "not_found",
            BoardError::InvalidTransition { .. } => "invalid_transition",
            BoardError::JobClosed(_) => "job_closed",
            BoardError::ConcurrentModification { .. } => "concurrent_modification",
            BoardError::Store(_) => "store_error",
        }
    }
}
