//! Check-in log operations.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

use super::models::Checkin;
use super::rules::{can_check_in, ensure_can_check_in, remaining};
use crate::common::{ApiError, ParticipantId};
use crate::domains::participants::actions::get_participant;
use crate::domains::participants::models::Participant;

/// Whether a participant may still be admitted, with their history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinStatus {
    pub participant: Participant,
    pub total_checkins: i64,
    pub remaining_checkins: i64,
    pub can_check_in: bool,
    pub checkins: Vec<Checkin>,
}

/// Append a check-in for `participant_id`, stamped with `staff`.
pub async fn record_checkin(
    participant_id: ParticipantId,
    staff: &str,
    pool: &PgPool,
) -> Result<Checkin, ApiError> {
    let mut tx = pool.begin().await?;

    Participant::lock_for_update(participant_id, &mut *tx)
        .await?
        .ok_or_else(|| ApiError::not_found("Participant", "ID", participant_id))?;

    let recorded = Checkin::count_for_participant(participant_id, &mut *tx).await?;
    ensure_can_check_in(recorded)?;

    let checkin = Checkin::new(participant_id, staff).insert(&mut *tx).await?;
    tx.commit().await?;

    info!(
        checkin_id = %checkin.id,
        participant_id = %participant_id,
        staff,
        number = recorded + 1,
        "Check-in recorded"
    );
    Ok(checkin)
}

/// Newest first.
pub async fn list_checkins(participant_id: ParticipantId, pool: &PgPool) -> Result<Vec<Checkin>, ApiError> {
    get_participant(participant_id, pool).await?;
    Ok(Checkin::find_by_participant(participant_id, pool).await?)
}

pub async fn checkin_status(participant_id: ParticipantId, pool: &PgPool) -> Result<CheckinStatus, ApiError> {
    let participant = get_participant(participant_id, pool).await?;
    let checkins = Checkin::find_by_participant(participant_id, pool).await?;
    let total = checkins.len() as i64;

    Ok(CheckinStatus {
        participant,
        total_checkins: total,
        remaining_checkins: remaining(total),
        can_check_in: can_check_in(total),
        checkins,
    })
}
