use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path,
    },
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::common::{ApiError, ParticipantId, TicketId};
use crate::domains::tickets::{actions, CreateTicketRequest, Ticket, UpdateTicketRequest};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

pub async fn create_ticket_handler(
    Extension(state): Extension<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<CreateTicketRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let Json(request) = body?;
    let request = request.validate()?;

    let ticket = actions::create_ticket(request, &state.db_pool).await?;
    info!(
        username = %user.username,
        ticket_id = %ticket.id,
        participant_id = %ticket.participant_id,
        "Created ticket"
    );
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn list_tickets_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    Ok(Json(actions::list_tickets(&state.db_pool).await?))
}

pub async fn get_ticket_handler(
    Extension(state): Extension<AppState>,
    path: Result<Path<TicketId>, PathRejection>,
) -> Result<Json<Ticket>, ApiError> {
    let Path(id) = path?;
    Ok(Json(actions::get_ticket(id, &state.db_pool).await?))
}

pub async fn participant_tickets_handler(
    Extension(state): Extension<AppState>,
    path: Result<Path<ParticipantId>, PathRejection>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    let Path(participant_id) = path?;
    Ok(Json(
        actions::list_for_participant(participant_id, &state.db_pool).await?,
    ))
}

pub async fn update_ticket_handler(
    Extension(state): Extension<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<TicketId>, PathRejection>,
    body: Result<Json<UpdateTicketRequest>, JsonRejection>,
) -> Result<Json<Ticket>, ApiError> {
    let Path(id) = path?;
    let Json(request) = body?;
    let request = request.validate()?;

    let ticket = actions::update_ticket(id, request, &state.db_pool).await?;
    info!(username = %user.username, ticket_id = %id, "Updated ticket");
    Ok(Json(ticket))
}

/// Admit a ticket, recording the authenticated username.
pub async fn check_in_ticket_handler(
    Extension(state): Extension<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<TicketId>, PathRejection>,
) -> Result<Json<Ticket>, ApiError> {
    let Path(id) = path?;
    let ticket = actions::check_in_ticket(id, &user.username, &state.db_pool).await?;
    Ok(Json(ticket))
}

pub async fn delete_ticket_handler(
    Extension(state): Extension<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<TicketId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = path?;
    actions::delete_ticket(id, &state.db_pool).await?;
    info!(username = %user.username, ticket_id = %id, "Deleted ticket");
    Ok(StatusCode::NO_CONTENT)
}
