use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use crate::common::{CheckinId, ParticipantId};

/// Checkin - one entry in a participant's append-only admission log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Checkin {
    pub id: CheckinId,
    pub participant_id: ParticipantId,
    pub checked_in_at: DateTime<Utc>,
    pub staff: String, // email, or username when no email is known
}

impl Checkin {
    pub fn new(participant_id: ParticipantId, staff: &str) -> Self {
        Self {
            id: CheckinId::new(),
            participant_id,
            checked_in_at: Utc::now(),
            staff: staff.to_string(),
        }
    }

    /// Newest first.
    pub async fn find_by_participant(participant_id: ParticipantId, pool: &PgPool) -> Result<Vec<Self>> {
        let checkins = sqlx::query_as::<_, Checkin>(
            r#"
            SELECT * FROM checkins
            WHERE participant_id = $1
            ORDER BY checked_in_at DESC, id DESC
            "#,
        )
        .bind(participant_id)
        .fetch_all(pool)
        .await?;
        Ok(checkins)
    }

    pub async fn count_for_participant(participant_id: ParticipantId, db: impl PgExecutor<'_>) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM checkins WHERE participant_id = $1")
                .bind(participant_id)
                .fetch_one(db)
                .await?;
        Ok(count)
    }

    pub async fn insert(&self, db: impl PgExecutor<'_>) -> Result<Self> {
        let checkin = sqlx::query_as::<_, Checkin>(
            r#"
            INSERT INTO checkins (id, participant_id, checked_in_at, staff)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.participant_id)
        .bind(self.checked_in_at)
        .bind(&self.staff)
        .fetch_one(db)
        .await?;
        Ok(checkin)
    }
}
