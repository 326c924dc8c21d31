//! Staff account commands.
//!
//! # Usage
//!
//! ```bash
//! IM_ADMIN_PASSWORD='...' im-cli admin create -e admin@iranmarket.ir -n "Sara" -r super_admin
//! ```
//!
//! Without `IM_ADMIN_PASSWORD` the password is prompted for on the terminal
//! with echo disabled. When standard input is not a terminal, the first line
//! of it is read instead, so `echo "$PW" | im-cli admin create ...` works.
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - admin database (falls back to `DATABASE_URL`)
//! - `IM_ADMIN_PASSWORD` - password for the new account

use std::io::{BufRead, IsTerminal};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use iranmarket_admin::services::auth::{AdminAuthError, AdminAuthService};
use iranmarket_core::AdminRole;
use iranmarket_core::db::create_pool;

use super::database_url;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid role: {0}. Valid roles: super_admin, admin, viewer")]
    InvalidRole(String),

    #[error("Could not read password: {0}")]
    Prompt(#[from] std::io::Error),

    #[error("No password given")]
    EmptyPassword,

    #[error(transparent)]
    Auth(#[from] AdminAuthError),
}

/// Create a staff account.
///
/// # Errors
///
/// Returns `AdminError` for an unknown role, a missing password or database
/// URL, or when the account cannot be created (bad email, weak password,
/// email already taken).
pub async fn create_user(email: &str, name: &str, role: &str) -> Result<i32, AdminError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;

    let password = match std::env::var("IM_ADMIN_PASSWORD") {
        Ok(password) if !password.is_empty() => SecretString::from(password),
        _ => prompt_password()?,
    };

    let url = database_url("ADMIN_DATABASE_URL")
        .ok_or(AdminError::MissingEnvVar("ADMIN_DATABASE_URL"))?;

    tracing::info!("Connecting to admin database...");
    let pool = create_pool(&SecretString::from(url)).await?;

    let user = AdminAuthService::new(&pool)
        .create_admin(email, name, role, password.expose_secret())
        .await?;

    tracing::info!(
        "Admin user created. ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(user.id.as_i32())
}

fn prompt_password() -> Result<SecretString, AdminError> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        let password = rpassword::prompt_password("Password: ")?;
        return non_empty(&password);
    }
    read_password_line(stdin.lock())
}

/// First line of a piped password.
fn read_password_line(mut input: impl BufRead) -> Result<SecretString, AdminError> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    non_empty(&line)
}

fn non_empty(password: &str) -> Result<SecretString, AdminError> {
    let password = password.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(AdminError::EmptyPassword);
    }
    Ok(SecretString::from(password.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_piped_password_takes_first_line() {
        let password = read_password_line(Cursor::new("s3cret pass\nignored\n")).unwrap();
        assert_eq!(password.expose_secret(), "s3cret pass");
    }

    #[test]
    fn test_empty_piped_password_is_rejected() {
        assert!(matches!(
            read_password_line(Cursor::new("\r\n")),
            Err(AdminError::EmptyPassword)
        ));
        assert!(matches!(
            read_password_line(Cursor::new("")),
            Err(AdminError::EmptyPassword)
        ));
    }

    #[tokio::test]
    async fn test_unknown_role_is_rejected_before_prompting() {
        let err = create_user("a@b.ir", "A", "owner").await.unwrap_err();
        assert!(matches!(err, AdminError::InvalidRole(role) if role == "owner"));
    }
}
