//! OTP login.
//!
//! 1. [`LoginService::request_code`] stores a fresh 6-digit code and sends it
//!    by mail (email identifiers) or through the SMS stub (phones).
//! 2. [`LoginService::verify`] checks a guess against the latest unused code
//!    under a row lock and, on success, returns the (possibly new) account.

use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, instrument};

use iranmarket_core::LoginIdentifier;
use iranmarket_core::notify::Notifier;
use iranmarket_core::otp::{OTP_TTL, OtpOutcome, generate_code};

use crate::db::RepositoryError;
use crate::db::customers::UserRepository;
use crate::db::otp::OtpRepository;
use crate::models::UserAccount;

/// Result of a verification attempt.
#[derive(Debug)]
pub enum VerifyOutcome {
    /// Code accepted; the customer is known and has a profile.
    LoggedIn(UserAccount),
    /// No unused code exists for the identifier.
    NoCode,
    /// The latest code was rejected.
    Rejected(OtpOutcome),
}

impl VerifyOutcome {
    /// Message shown to the customer on failure.
    #[must_use]
    pub const fn error_message(&self) -> Option<&'static str> {
        match self {
            Self::LoggedIn(_) | Self::Rejected(OtpOutcome::Accepted) => None,
            Self::NoCode => Some("کد ورود معتبر نیست. لطفاً دوباره تلاش کنید."),
            Self::Rejected(OtpOutcome::Expired) => {
                Some("کد ورود منقضی شده است. دوباره وارد شوید.")
            }
            Self::Rejected(OtpOutcome::TooManyAttempts) => {
                Some("تعداد تلاش‌های ناموفق زیاد بود. دوباره کد دریافت کنید.")
            }
            Self::Rejected(OtpOutcome::Mismatch) => Some("کد وارد شده صحیح نیست."),
        }
    }

    /// Whether the customer must go back and request a new code.
    #[must_use]
    pub const fn needs_new_code(&self) -> bool {
        matches!(
            self,
            Self::NoCode | Self::Rejected(OtpOutcome::Expired | OtpOutcome::TooManyAttempts)
        )
    }
}

/// Text of the login SMS.
#[must_use]
pub fn sms_text(code: &str) -> String {
    format!("کد ورود شما به ایران مارکت: {code}")
}

/// OTP login service.
pub struct LoginService<'a> {
    otps: OtpRepository<'a>,
    users: UserRepository<'a>,
    notifier: &'a Notifier,
}

impl<'a> LoginService<'a> {
    /// Create a new login service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, notifier: &'a Notifier) -> Self {
        Self {
            otps: OtpRepository::new(pool),
            users: UserRepository::new(pool),
            notifier,
        }
    }

    /// Issue and deliver a new code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the code cannot be stored. Delivery
    /// failures are logged only.
    #[instrument(skip(self, identifier), fields(email = identifier.is_email()))]
    pub async fn request_code(&self, identifier: &LoginIdentifier) -> Result<(), RepositoryError> {
        let code = generate_code();
        let expires_at = Utc::now() + OTP_TTL;
        self.otps
            .create(identifier.as_str(), &code, expires_at)
            .await?;

        match identifier.email() {
            Some(email) => self.notifier.login_code(email, &code).await,
            None => self.notifier.send_sms(identifier.as_str(), &sms_text(&code)),
        }
        info!("login code issued");
        Ok(())
    }

    /// Check `submitted` against the latest unused code for `identifier`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails.
    #[instrument(skip(self, identifier, submitted))]
    pub async fn verify(
        &self,
        identifier: &str,
        submitted: &str,
    ) -> Result<VerifyOutcome, RepositoryError> {
        let Some(outcome) = self.otps.attempt(identifier, submitted, Utc::now()).await? else {
            return Ok(VerifyOutcome::NoCode);
        };
        if outcome != OtpOutcome::Accepted {
            info!(?outcome, "login code rejected");
            return Ok(VerifyOutcome::Rejected(outcome));
        }

        let email = identifier.contains('@').then_some(identifier);
        let user = self.users.login(identifier, email).await?;
        self.users.profile(&user).await?;
        info!(user_id = %user.id, "customer logged in");
        Ok(VerifyOutcome::LoggedIn(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_mismatch_allows_retry() {
        assert!(VerifyOutcome::NoCode.needs_new_code());
        assert!(VerifyOutcome::Rejected(OtpOutcome::Expired).needs_new_code());
        assert!(VerifyOutcome::Rejected(OtpOutcome::TooManyAttempts).needs_new_code());
        assert!(!VerifyOutcome::Rejected(OtpOutcome::Mismatch).needs_new_code());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            VerifyOutcome::Rejected(OtpOutcome::Mismatch).error_message(),
            Some("کد وارد شده صحیح نیست.")
        );
        assert!(VerifyOutcome::Rejected(OtpOutcome::Accepted).error_message().is_none());
    }

    #[test]
    fn test_sms_text_contains_code() {
        assert!(sms_text("123456").ends_with("123456"));
    }
}
