use axum::{
    extract::{rejection::PathRejection, Extension, Path},
    http::StatusCode,
    Json,
};

use crate::common::{ApiError, ParticipantId};
use crate::domains::checkins::{actions, Checkin, CheckinStatus};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

/// Record a check-in stamped with the staff member's email (or username).
pub async fn record_checkin_handler(
    Extension(state): Extension<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<ParticipantId>, PathRejection>,
) -> Result<(StatusCode, Json<Checkin>), ApiError> {
    let Path(participant_id) = path?;
    let checkin =
        actions::record_checkin(participant_id, user.staff_identifier(), &state.db_pool).await?;
    Ok((StatusCode::CREATED, Json(checkin)))
}

pub async fn participant_checkins_handler(
    Extension(state): Extension<AppState>,
    path: Result<Path<ParticipantId>, PathRejection>,
) -> Result<Json<Vec<Checkin>>, ApiError> {
    let Path(participant_id) = path?;
    Ok(Json(
        actions::list_checkins(participant_id, &state.db_pool).await?,
    ))
}

pub async fn checkin_status_handler(
    Extension(state): Extension<AppState>,
    path: Result<Path<ParticipantId>, PathRejection>,
) -> Result<Json<CheckinStatus>, ApiError> {
    let Path(participant_id) = path?;
    Ok(Json(
        actions::checkin_status(participant_id, &state.db_pool).await?,
    ))
}
