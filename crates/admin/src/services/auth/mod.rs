//! Admin authentication service.
//!
//! Staff sign in with email and password. Passwords are stored as Argon2id
//! PHC strings in `admin.admin_user.password_hash`.

mod error;

pub use error::AdminAuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use iranmarket_core::{AdminRole, Email};

use crate::db::AdminUserRepository;
use crate::models::AdminUser;

/// Shortest accepted staff password.
pub const MIN_PASSWORD_LENGTH: usize = 10;

/// Verified against when the email is unknown, so both failures take as long.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$X0cmnwmHJvPTm5b3s2fzFEUpTuVPdCzAC6AdkcTcS7c";

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminAuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Check an email and password and stamp the login.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidCredentials` for an unknown email or a
    /// wrong password, `AdminAuthError::InvalidEmail` for a malformed email.
    pub async fn login(&self, email: &str, password: &str) -> Result<AdminUser, AdminAuthError> {
        let email = Email::parse(email)?;
        let repo = AdminUserRepository::new(self.pool);

        let Some((user, hash)) = repo.get_with_password_hash(&email).await? else {
            let _ = verify_password(password, DUMMY_HASH);
            return Err(AdminAuthError::InvalidCredentials);
        };
        verify_password(password, &hash)?;

        repo.record_login(user.id).await?;
        tracing::info!(admin_id = %user.id, "admin logged in");
        Ok(user)
    }

    /// Create a staff account.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::WeakPassword` for a short password and
    /// `AdminAuthError::UserAlreadyExists` if the email is taken.
    pub async fn create_admin(
        &self,
        email: &str,
        name: &str,
        role: AdminRole,
        password: &str,
    ) -> Result<AdminUser, AdminAuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let hash = hash_password(password)?;
        let user = AdminUserRepository::new(self.pool)
            .create(&email, name.trim(), role, &hash)
            .await?;
        tracing::info!(admin_id = %user.id, role = %role, "admin user created");
        Ok(user)
    }
}

/// Validate password strength.
///
/// # Errors
///
/// Returns `AdminAuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AdminAuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AdminAuthError::WeakPassword(MIN_PASSWORD_LENGTH));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AdminAuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AdminAuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AdminAuthError::PasswordHash)
}

/// Verify a password against a stored hash.
///
/// # Errors
///
/// Returns `AdminAuthError::InvalidCredentials` on mismatch or a malformed hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AdminAuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AdminAuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AdminAuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::RepositoryError;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("zaferan-1403").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("zaferan-1403", &hash).is_ok());
        assert!(matches!(
            verify_password("zaferan-1404", &hash),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_malformed_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_dummy_hash_parses() {
        assert!(PasswordHash::new(DUMMY_HASH).is_ok());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("کوتاه").is_err());
        assert!(validate_password("یک-رمز-طولانی").is_ok());
    }

    #[test]
    fn test_conflict_maps_to_user_exists() {
        let err = AdminAuthError::from(RepositoryError::Conflict("admin user".to_owned()));
        assert!(matches!(err, AdminAuthError::UserAlreadyExists));
    }
}
