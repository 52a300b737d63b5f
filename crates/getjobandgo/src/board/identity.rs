use serde::{Deserialize, Serialize};

use super::domain::{Profile, ProfileId, Role};
use super::error::BoardError;
use super::repository::RepositoryError;

/// Authenticated actor passed explicitly into every store and lifecycle call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: ProfileId,
    pub role: Role,
}

impl Session {
    pub fn new(user_id: ProfileId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// True when the session belongs to the profile that owns `id`.
    pub fn owns(&self, id: &ProfileId) -> bool {
        &self.user_id == id
    }
}

impl From<&Profile> for Session {
    fn from(profile: &Profile) -> Self {
        Self::new(profile.id.clone(), profile.role)
    }
}

/// Session collaborator: issues bearer tokens and resolves them back to actors.
pub trait IdentityProvider: Send + Sync {
    fn issue(&self, profile: &Profile) -> Result<String, RepositoryError>;
    fn resolve(&self, token: &str) -> Result<Option<Session>, RepositoryError>;
    fn revoke(&self, token: &str) -> Result<(), RepositoryError>;
}

/// Pass `session` through when it exists and carries one of the `allowed` roles.
pub fn require_role<'a>(
    session: Option<&'a Session>,
    allowed: &[Role],
) -> Result<&'a Session, BoardError> {
    match session {
        Some(session) if allowed.contains(&session.role) => Ok(session),
        _ => Err(BoardError::Unauthorized),
    }
}
