use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use crate::common::{ParticipantId, TicketId};

/// Ticket - admission bought by a participant, checked in at most once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    pub id: TicketId,
    pub participant_id: ParticipantId,
    pub quantity: i32, // 1 or 2
    pub purchased_at: DateTime<Utc>,
    pub checked_in: bool,
    pub checked_in_by: Option<String>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn new(participant_id: ParticipantId, quantity: i32, purchased_at: Option<DateTime<Utc>>) -> Self {
        let now = Utc::now();
        Self {
            id: TicketId::new(),
            participant_id,
            quantity,
            purchased_at: purchased_at.unwrap_or(now),
            checked_in: false,
            checked_in_by: None,
            checked_in_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub async fn find_by_id(id: TicketId, db: impl PgExecutor<'_>) -> Result<Option<Self>> {
        let ticket = sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(ticket)
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let tickets = sqlx::query_as::<_, Ticket>(
            "SELECT * FROM tickets ORDER BY purchased_at DESC, id DESC",
        )
        .fetch_all(pool)
        .await?;
        Ok(tickets)
    }

    pub async fn find_by_participant(
        participant_id: ParticipantId,
        db: impl PgExecutor<'_>,
    ) -> Result<Vec<Self>> {
        let tickets = sqlx::query_as::<_, Ticket>(
            "SELECT * FROM tickets WHERE participant_id = $1 ORDER BY purchased_at, id",
        )
        .bind(participant_id)
        .fetch_all(db)
        .await?;
        Ok(tickets)
    }

    /// Sum of quantities held by a participant, optionally leaving one ticket out.
    pub async fn total_quantity(
        participant_id: ParticipantId,
        excluding: Option<TicketId>,
        db: impl PgExecutor<'_>,
    ) -> Result<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM tickets
            WHERE participant_id = $1 AND ($2::uuid IS NULL OR id <> $2)
            "#,
        )
        .bind(participant_id)
        .bind(excluding)
        .fetch_one(db)
        .await?;
        Ok(total)
    }

    pub async fn insert(&self, db: impl PgExecutor<'_>) -> Result<Self> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO tickets (
                id, participant_id, quantity, purchased_at, checked_in,
                checked_in_by, checked_in_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.participant_id)
        .bind(self.quantity)
        .bind(self.purchased_at)
        .bind(self.checked_in)
        .bind(&self.checked_in_by)
        .bind(self.checked_in_at)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(db)
        .await?;
        Ok(ticket)
    }

    /// Persist owner, quantity and purchase time. The check-in fields are
    /// only ever written by `mark_checked_in`.
    pub async fn update(&self, db: impl PgExecutor<'_>) -> Result<Self> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets
            SET participant_id = $2,
                quantity = $3,
                purchased_at = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.participant_id)
        .bind(self.quantity)
        .bind(self.purchased_at)
        .fetch_one(db)
        .await?;
        Ok(ticket)
    }

    /// Flip the check-in flag if it is still unset.
    ///
    /// `None` means the ticket is missing or was already checked in.
    pub async fn mark_checked_in(id: TicketId, staff: &str, pool: &PgPool) -> Result<Option<Self>> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets
            SET checked_in = TRUE,
                checked_in_by = $2,
                checked_in_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND checked_in = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(staff)
        .fetch_optional(pool)
        .await?;
        Ok(ticket)
    }

    pub async fn delete(id: TicketId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
