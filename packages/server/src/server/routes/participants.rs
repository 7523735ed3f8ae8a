use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::common::{Actor, ApiError, Capability, ParticipantId};
use crate::domains::participants::{
    actions, CreateParticipantRequest, ListQuery, Participant, ParticipantDetail, SearchQuery,
    UpdateParticipantRequest,
};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

type ParticipantList = Result<Json<Vec<Participant>>, ApiError>;

pub async fn create_participant_handler(
    Extension(state): Extension<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<CreateParticipantRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Participant>), ApiError> {
    let Json(request) = body?;
    let new = request.validate()?;

    let participant = actions::create_participant(new, &state.db_pool).await?;
    info!(username = %user.username, participant_id = %participant.id, "Created participant");
    Ok((StatusCode::CREATED, Json(participant)))
}

/// List everyone, or run the unified search when `q` is given.
pub async fn list_participants_handler(
    Extension(state): Extension<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ParticipantList {
    let Query(query) = query?;
    let participants = match query.q {
        Some(q) => actions::search_unified(&q, &state.db_pool).await?,
        None => actions::list_participants(&state.db_pool).await?,
    };
    Ok(Json(participants))
}

pub async fn unified_search_handler(
    Extension(state): Extension<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ParticipantList {
    let Query(query) = query?;
    let q = query.query.unwrap_or_default();
    Ok(Json(actions::search_unified(&q, &state.db_pool).await?))
}

pub async fn classified_search_handler(
    Extension(state): Extension<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ParticipantList {
    let Path(query) = path?;
    Ok(Json(actions::search_classified(&query, &state.db_pool).await?))
}

pub async fn get_by_cpf_handler(
    Extension(state): Extension<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Participant>, ApiError> {
    let Path(cpf) = path?;
    Ok(Json(actions::get_by_cpf(&cpf, &state.db_pool).await?))
}

pub async fn get_by_ra_handler(
    Extension(state): Extension<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Participant>, ApiError> {
    let Path(ra) = path?;
    Ok(Json(actions::get_by_ra(&ra, &state.db_pool).await?))
}

pub async fn get_by_rf_handler(
    Extension(state): Extension<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Participant>, ApiError> {
    let Path(rf) = path?;
    Ok(Json(actions::get_by_rf(&rf, &state.db_pool).await?))
}

pub async fn search_by_name_handler(
    Extension(state): Extension<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ParticipantList {
    let Path(name) = path?;
    Ok(Json(actions::search_by_name(&name, &state.db_pool).await?))
}

pub async fn get_participant_handler(
    Extension(state): Extension<AppState>,
    path: Result<Path<ParticipantId>, PathRejection>,
) -> Result<Json<ParticipantDetail>, ApiError> {
    let Path(id) = path?;
    Ok(Json(actions::get_participant_detail(id, &state.db_pool).await?))
}

pub async fn update_participant_handler(
    Extension(state): Extension<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<ParticipantId>, PathRejection>,
    body: Result<Json<UpdateParticipantRequest>, JsonRejection>,
) -> Result<Json<Participant>, ApiError> {
    let Path(id) = path?;
    let Json(request) = body?;
    let changes = request.validate()?;

    let participant = actions::update_participant(id, changes, &state.db_pool).await?;
    info!(username = %user.username, participant_id = %id, "Updated participant");
    Ok(Json(participant))
}

pub async fn delete_participant_handler(
    Extension(state): Extension<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<ParticipantId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    Actor::new(&user.username, &user.roles)
        .can(Capability::DeleteParticipants)
        .check(state.deps.as_ref())?;

    let Path(id) = path?;
    actions::delete_participant(id, &state.db_pool).await?;
    info!(username = %user.username, participant_id = %id, "Deleted participant");
    Ok(StatusCode::NO_CONTENT)
}
