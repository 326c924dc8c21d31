//! Login identifiers: either a mobile number or an email address.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::email::{Email, EmailError};

/// Why an identifier was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("identifier cannot be empty")]
    Empty,
    #[error("invalid email: {0}")]
    Email(#[from] EmailError),
    #[error("phone number must be 10 to 15 digits")]
    Phone,
}

/// What a customer types into the login form.
///
/// The normalized string doubles as the account username.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LoginIdentifier {
    Email(Email),
    /// Digits only, with an optional leading `+`.
    Phone(String),
}

impl LoginIdentifier {
    /// Classify and normalize raw form input.
    ///
    /// Anything containing `@` is treated as an email. Phone numbers may be
    /// typed with spaces or dashes and with Persian or Arabic digits.
    ///
    /// ```
    /// use iranmarket_core::LoginIdentifier;
    ///
    /// let phone = LoginIdentifier::parse("۰۹۱۲ ۳۴۵ ۶۷۸۹").unwrap();
    /// assert_eq!(phone.as_str(), "09123456789");
    /// assert!(LoginIdentifier::parse("user@example.com").unwrap().is_email());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] for empty input, malformed emails, or phone
    /// numbers outside 10..=15 digits.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if raw.contains('@') {
            return Ok(Self::Email(Email::parse(raw)?));
        }

        let mut phone = String::with_capacity(raw.len());
        for (i, ch) in raw.chars().enumerate() {
            match ch {
                '+' if i == 0 => phone.push('+'),
                ' ' | '-' => {}
                _ => phone.push(ascii_digit(ch).ok_or(IdentifierError::Phone)?),
            }
        }
        let digits = phone.trim_start_matches('+').len();
        if !(10..=15).contains(&digits) {
            return Err(IdentifierError::Phone);
        }
        Ok(Self::Phone(phone))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Email(email) => email.as_str(),
            Self::Phone(phone) => phone,
        }
    }

    #[must_use]
    pub const fn is_email(&self) -> bool {
        matches!(self, Self::Email(_))
    }

    /// The email, when the customer logged in with one.
    #[must_use]
    pub const fn email(&self) -> Option<&Email> {
        match self {
            Self::Email(email) => Some(email),
            Self::Phone(_) => None,
        }
    }
}

impl fmt::Display for LoginIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map ASCII, Persian (U+06F0..) and Arabic-Indic (U+0660..) digits to ASCII.
fn ascii_digit(ch: char) -> Option<char> {
    let zero = match ch {
        '0'..='9' => return Some(ch),
        '\u{06F0}'..='\u{06F9}' => 0x06F0,
        '\u{0660}'..='\u{0669}' => 0x0660,
        _ => return None,
    };
    let offset = u32::from(ch) - zero;
    char::from_digit(offset, 10)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_normalization() {
        let id = LoginIdentifier::parse(" 0912-345-6789 ").unwrap();
        assert_eq!(id, LoginIdentifier::Phone("09123456789".to_owned()));

        let intl = LoginIdentifier::parse("+98 912 345 6789").unwrap();
        assert_eq!(intl.as_str(), "+989123456789");
    }

    #[test]
    fn test_arabic_digits() {
        let id = LoginIdentifier::parse("٠٩١٢٣٤٥٦٧٨٩").unwrap();
        assert_eq!(id.as_str(), "09123456789");
    }

    #[test]
    fn test_email_identifier() {
        let id = LoginIdentifier::parse("Buyer@Shop.IR").unwrap();
        assert!(id.is_email());
        assert_eq!(id.as_str(), "Buyer@shop.ir");
        assert_eq!(id.email().map(Email::as_str), Some("Buyer@shop.ir"));
    }

    #[test]
    fn test_rejections() {
        assert_eq!(LoginIdentifier::parse("  "), Err(IdentifierError::Empty));
        assert_eq!(LoginIdentifier::parse("12345"), Err(IdentifierError::Phone));
        assert_eq!(
            LoginIdentifier::parse("0912abc4567"),
            Err(IdentifierError::Phone)
        );
        assert_eq!(LoginIdentifier::parse("9+12345678901"), Err(IdentifierError::Phone));
        assert!(matches!(
            LoginIdentifier::parse("a@b"),
            Err(IdentifierError::Email(_))
        ));
    }
}
