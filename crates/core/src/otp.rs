//! One-time login codes.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// How long a code stays valid.
pub const OTP_TTL: Duration = Duration::minutes(5);

/// Wrong guesses allowed before a code is burned.
pub const MAX_OTP_ATTEMPTS: i32 = 5;

/// Generate a 6-digit code (100000..=999999).
#[must_use]
pub fn generate_code() -> String {
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

/// The state of a stored code when a guess arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub attempts: i32,
}

/// Result of checking a submitted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpOutcome {
    /// Correct code; mark it used and log the customer in.
    Accepted,
    /// Past `expires_at`; mark it used.
    Expired,
    /// Attempt limit already reached; mark it used.
    TooManyAttempts,
    /// Wrong code; bump the attempt counter.
    Mismatch,
}

impl OtpOutcome {
    /// Whether the stored code must be retired.
    #[must_use]
    pub const fn burns_code(self) -> bool {
        !matches!(self, Self::Mismatch)
    }
}

impl OtpRecord {
    /// Check `submitted` against this record.
    ///
    /// Surrounding whitespace is ignored. Expiry is checked before the
    /// attempt limit so an old code always reports as expired.
    #[must_use]
    pub fn check(&self, submitted: &str, now: DateTime<Utc>) -> OtpOutcome {
        if now > self.expires_at {
            OtpOutcome::Expired
        } else if self.attempts >= MAX_OTP_ATTEMPTS {
            OtpOutcome::TooManyAttempts
        } else if submitted.trim() == self.code {
            OtpOutcome::Accepted
        } else {
            OtpOutcome::Mismatch
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(attempts: i32, expires_in: Duration) -> OtpRecord {
        OtpRecord {
            code: "123456".to_owned(),
            expires_at: Utc::now() + expires_in,
            attempts,
        }
    }

    #[test]
    fn test_generated_code_is_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert!(!code.starts_with('0'));
        }
    }

    #[test]
    fn test_accepts_matching_code() {
        let r = record(0, Duration::minutes(1));
        assert_eq!(r.check(" 123456 ", Utc::now()), OtpOutcome::Accepted);
    }

    #[test]
    fn test_mismatch_does_not_burn() {
        let r = record(2, Duration::minutes(1));
        let outcome = r.check("654321", Utc::now());
        assert_eq!(outcome, OtpOutcome::Mismatch);
        assert!(!outcome.burns_code());
    }

    #[test]
    fn test_expired_wins() {
        let r = record(MAX_OTP_ATTEMPTS, -Duration::seconds(1));
        assert_eq!(r.check("123456", Utc::now()), OtpOutcome::Expired);
    }

    #[test]
    fn test_attempt_limit() {
        let r = record(MAX_OTP_ATTEMPTS, Duration::minutes(1));
        let outcome = r.check("123456", Utc::now());
        assert_eq!(outcome, OtpOutcome::TooManyAttempts);
        assert!(outcome.burns_code());
    }
}
