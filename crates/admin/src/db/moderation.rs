//! Review moderation and support tickets.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use iranmarket_core::{ReviewId, TicketId, TicketStatus, UserId};

use super::RepositoryError;
use crate::models::{Review, Ticket};

/// Rows shown per moderation list.
pub const LIST_LIMIT: i64 = 200;

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    product_name: String,
    product_slug: String,
    username: String,
    rating: i16,
    title: String,
    comment: String,
    is_approved: bool,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            product_name: row.product_name,
            product_slug: row.product_slug,
            username: row.username,
            rating: row.rating,
            title: row.title,
            comment: row.comment,
            is_approved: row.is_approved,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: TicketId,
    user_id: UserId,
    username: String,
    subject: String,
    message: String,
    status: TicketStatus,
    admin_reply: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TicketRow> for Ticket {
    fn from(row: TicketRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            username: row.username,
            subject: row.subject,
            message: row.message,
            status: row.status,
            admin_reply: row.admin_reply,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const TICKET_SELECT: &str = "SELECT t.id, t.user_id, u.username, t.subject, t.message, \
     t.status, t.admin_reply, t.created_at, t.updated_at \
     FROM shop.support_ticket t \
     JOIN shop.user_account u ON u.id = t.user_id";

/// Repository for reviews and tickets.
pub struct ModerationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ModerationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Latest reviews, unapproved first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reviews(&self) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT r.id, p.name AS product_name, p.slug AS product_slug, u.username,
                   r.rating, r.title, r.comment, r.is_approved, r.created_at
            FROM shop.review r
            JOIN shop.product p ON p.id = r.product_id
            JOIN shop.user_account u ON u.id = r.user_id
            ORDER BY r.is_approved, r.created_at DESC
            LIMIT $1
            ",
        )
        .bind(LIST_LIMIT)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Approve or hide a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review does not exist.
    pub async fn set_review_approved(
        &self,
        id: ReviewId,
        approved: bool,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.review SET is_approved = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(approved)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Latest tickets, open ones first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tickets(&self) -> Result<Vec<Ticket>, RepositoryError> {
        let sql = format!(
            "{TICKET_SELECT} ORDER BY (t.status = 'open') DESC, t.updated_at DESC LIMIT $1"
        );
        let rows = sqlx::query_as::<_, TicketRow>(&sql)
            .bind(LIST_LIMIT)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ticket(&self, id: TicketId) -> Result<Option<Ticket>, RepositoryError> {
        let sql = format!("{TICKET_SELECT} WHERE t.id = $1");
        let row = sqlx::query_as::<_, TicketRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Store the staff reply and new status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ticket does not exist.
    pub async fn answer_ticket(
        &self,
        id: TicketId,
        reply: &str,
        status: TicketStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.support_ticket
            SET admin_reply = $2, status = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(reply)
        .bind(status)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
