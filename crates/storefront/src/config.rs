//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! ## Optional
//! - `IM_HOST` - Bind address (default: 127.0.0.1)
//! - `IM_PORT` - Listen port (default: 3000)
//! - `IM_BASE_URL` - Public URL of the storefront (default: `http://localhost:3000`)
//! - `IM_SMTP_HOST`, `IM_SMTP_PORT`, `IM_SMTP_USERNAME`, `IM_SMTP_PASSWORD` -
//!   outgoing mail; when `IM_SMTP_HOST` is unset mails are only logged
//! - `IM_FROM_EMAIL` - Sender mailbox
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use iranmarket_core::notify::{DEFAULT_FROM_ADDRESS, MailConfig, SmtpSettings};

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Outgoing mail
    pub mail: MailConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g. "production")
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the SMTP password looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("IM_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("IM_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("IM_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("IM_PORT".to_string(), e.to_string()))?;
        let base_url = parse_base_url(
            "IM_BASE_URL",
            &get_env_or_default("IM_BASE_URL", "http://localhost:3000"),
        )?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            mail: mail_from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the site is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Mail settings from `IM_SMTP_*` and `IM_FROM_EMAIL`.
fn mail_from_env() -> Result<MailConfig, ConfigError> {
    let from_address = get_env_or_default("IM_FROM_EMAIL", DEFAULT_FROM_ADDRESS);

    let Some(host) = get_optional_env("IM_SMTP_HOST") else {
        return Ok(MailConfig {
            smtp: None,
            from_address,
        });
    };

    let port = get_env_or_default("IM_SMTP_PORT", "587")
        .parse::<u16>()
        .map_err(|e| ConfigError::InvalidEnvVar("IM_SMTP_PORT".to_string(), e.to_string()))?;
    let username = get_env_or_default("IM_SMTP_USERNAME", "");
    let password = SecretString::from(get_env_or_default("IM_SMTP_PASSWORD", ""));
    if !password.expose_secret().is_empty() {
        reject_placeholder(password.expose_secret(), "IM_SMTP_PASSWORD")?;
    }

    Ok(MailConfig {
        smtp: Some(SmtpSettings {
            host,
            port,
            username,
            password,
        }),
        from_address,
    })
}

/// Parse a base URL, accepting only http(s) URLs with a host.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an http(s) URL with a host".to_string(),
        ));
    }
    Ok(url)
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Reject values copied verbatim from a sample `.env`.
fn reject_placeholder(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: Url::parse("http://localhost:3000").unwrap(),
            mail: MailConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_secure_follows_scheme() {
        let mut config = config();
        assert!(!config.is_secure());
        config.base_url = Url::parse("https://iranmarket.ir").unwrap();
        assert!(config.is_secure());
    }

    #[test]
    fn test_parse_base_url() {
        assert!(parse_base_url("K", "https://shop.example.ir/").is_ok());
        assert!(matches!(
            parse_base_url("K", "ftp://shop.example.ir"),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(parse_base_url("K", "not a url").is_err());
    }

    #[test]
    fn test_reject_placeholder() {
        assert!(matches!(
            reject_placeholder("your-smtp-password", "K"),
            Err(ConfigError::InsecureSecret(..))
        ));
        assert!(reject_placeholder("q8Zr!m2Lp0", "K").is_ok());
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let mut config = config();
        config.database_url = SecretString::from("postgres://im:hunter2@db/im");
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
    }
}
