//! Customer support tickets.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use iranmarket_core::{TicketId, TicketStatus, UserId};

use super::RepositoryError;
use crate::models::Ticket;

#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: TicketId,
    subject: String,
    message: String,
    status: TicketStatus,
    admin_reply: String,
    created_at: DateTime<Utc>,
}

impl From<TicketRow> for Ticket {
    fn from(row: TicketRow) -> Self {
        Self {
            id: row.id,
            subject: row.subject,
            message: row.message,
            status: row.status,
            admin_reply: row.admin_reply,
            created_at: row.created_at,
        }
    }
}

/// Repository for the customer side of support tickets.
pub struct TicketRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TicketRepository<'a> {
    /// Create a new ticket repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The customer's tickets, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Ticket>, RepositoryError> {
        let rows = sqlx::query_as::<_, TicketRow>(
            r"
            SELECT id, subject, message, status, admin_reply, created_at
            FROM shop.support_ticket
            WHERE user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Ticket::from).collect())
    }

    /// Open a new ticket.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        subject: &str,
        message: &str,
    ) -> Result<TicketId, RepositoryError> {
        let id = sqlx::query_scalar(
            r"
            INSERT INTO shop.support_ticket (user_id, subject, message)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(subject)
        .bind(message)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }
}
