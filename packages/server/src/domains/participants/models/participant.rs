use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::common::ParticipantId;

/// Participant - a registered attendee, identified by CPF
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub cpf: String,        // 11 digits, unique
    pub ra: Option<String>, // 6 digits
    pub rf: Option<String>, // 4 digits
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries
// =============================================================================

impl Participant {
    pub fn new(name: String, cpf: String, ra: Option<String>, rf: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ParticipantId::new(),
            name,
            cpf,
            ra,
            rf,
            created_at: now,
            updated_at: now,
        }
    }

    pub async fn find_by_id(id: ParticipantId, db: impl PgExecutor<'_>) -> Result<Option<Self>> {
        let participant =
            sqlx::query_as::<_, Participant>("SELECT * FROM participants WHERE id = $1")
                .bind(id)
                .fetch_optional(db)
                .await?;
        Ok(participant)
    }

    /// Lock the participant row for the rest of the transaction.
    ///
    /// Every write bounded by a per-participant limit takes this lock first,
    /// so two such writes for the same participant run one after the other.
    pub async fn lock_for_update(id: ParticipantId, conn: &mut PgConnection) -> Result<Option<Self>> {
        let participant = sqlx::query_as::<_, Participant>(
            "SELECT * FROM participants WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(participant)
    }

    pub async fn find_by_cpf(cpf: &str, pool: &PgPool) -> Result<Option<Self>> {
        let participant =
            sqlx::query_as::<_, Participant>("SELECT * FROM participants WHERE cpf = $1")
                .bind(cpf)
                .fetch_optional(pool)
                .await?;
        Ok(participant)
    }

    /// RA is not unique; oldest registration first.
    pub async fn find_by_ra(ra: &str, pool: &PgPool) -> Result<Vec<Self>> {
        let participants = sqlx::query_as::<_, Participant>(
            "SELECT * FROM participants WHERE ra = $1 ORDER BY created_at, id",
        )
        .bind(ra)
        .fetch_all(pool)
        .await?;
        Ok(participants)
    }

    pub async fn find_by_rf(rf: &str, pool: &PgPool) -> Result<Vec<Self>> {
        let participants = sqlx::query_as::<_, Participant>(
            "SELECT * FROM participants WHERE rf = $1 ORDER BY created_at, id",
        )
        .bind(rf)
        .fetch_all(pool)
        .await?;
        Ok(participants)
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let participants = sqlx::query_as::<_, Participant>(
            "SELECT * FROM participants ORDER BY name, created_at",
        )
        .fetch_all(pool)
        .await?;
        Ok(participants)
    }

    /// Case-insensitive substring match on name.
    ///
    /// `pattern` must already be LIKE-escaped.
    pub async fn search_by_name(pattern: &str, pool: &PgPool) -> Result<Vec<Self>> {
        let participants = sqlx::query_as::<_, Participant>(
            r#"
            SELECT * FROM participants
            WHERE name ILIKE $1
            ORDER BY name, created_at
            "#,
        )
        .bind(format!("%{}%", pattern))
        .fetch_all(pool)
        .await?;
        Ok(participants)
    }

    /// Whether another participant already holds `cpf`.
    pub async fn cpf_taken(cpf: &str, except: Option<ParticipantId>, pool: &PgPool) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM participants
                WHERE cpf = $1 AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(cpf)
        .bind(except)
        .fetch_one(pool)
        .await?;
        Ok(taken)
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        let participant = sqlx::query_as::<_, Participant>(
            r#"
            INSERT INTO participants (id, name, cpf, ra, rf, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.cpf)
        .bind(&self.ra)
        .bind(&self.rf)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(pool)
        .await?;
        Ok(participant)
    }

    /// Write back every editable field. `None` when the row is gone.
    pub async fn update(&self, pool: &PgPool) -> Result<Option<Self>> {
        let participant = sqlx::query_as::<_, Participant>(
            r#"
            UPDATE participants
            SET name = $2,
                cpf = $3,
                ra = $4,
                rf = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.cpf)
        .bind(&self.ra)
        .bind(&self.rf)
        .fetch_optional(pool)
        .await?;
        Ok(participant)
    }

    /// Delete a participant. Tickets and check-ins go with it.
    ///
    /// Returns false when no row matched.
    pub async fn delete(id: ParticipantId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM participants WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
