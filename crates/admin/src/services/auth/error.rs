//! Admin authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during admin authentication operations.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] iranmarket_core::EmailError),

    /// Unknown email or wrong password. The two are not told apart.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("admin user already exists")]
    UserAlreadyExists,

    #[error("password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("failed to hash password")]
    PasswordHash,

    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for AdminAuthError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(_) => Self::UserAlreadyExists,
            other => Self::Repository(other),
        }
    }
}
