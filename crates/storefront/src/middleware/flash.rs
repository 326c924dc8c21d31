//! One-shot messages shown on the next rendered page.
//!
//! Messages live in the session until a page template takes them.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

/// Message severity, mapped to an alert style in templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

impl FlashLevel {
    /// CSS modifier for the alert box.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "alert-success",
            Self::Info => "alert-info",
            Self::Error => "alert-danger",
        }
    }
}

/// A pending message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub text: String,
}

/// Queue a message. Session failures are logged; the message is then lost.
pub async fn push(session: &Session, level: FlashLevel, text: impl Into<String>) {
    let mut pending: Vec<Flash> = session
        .get(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    pending.push(Flash {
        level,
        text: text.into(),
    });
    if let Err(e) = session.insert(session_keys::FLASH, &pending).await {
        tracing::warn!(error = %e, "failed to store flash message");
    }
}

pub async fn success(session: &Session, text: impl Into<String>) {
    push(session, FlashLevel::Success, text).await;
}

pub async fn info(session: &Session, text: impl Into<String>) {
    push(session, FlashLevel::Info, text).await;
}

pub async fn error(session: &Session, text: impl Into<String>) {
    push(session, FlashLevel::Error, text).await;
}

/// Remove and return every pending message.
pub async fn take(session: &Session) -> Vec<Flash> {
    session
        .remove::<Vec<Flash>>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_take_drains_in_order() {
        let session = session();
        success(&session, "saved").await;
        error(&session, "but not this").await;

        let messages = take(&session).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].level, FlashLevel::Success);
        assert_eq!(messages[1].text, "but not this");
        assert!(take(&session).await.is_empty());
    }

    #[test]
    fn test_css_class() {
        assert_eq!(FlashLevel::Error.css_class(), "alert-danger");
    }
}
