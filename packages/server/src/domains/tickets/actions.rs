//! Ticket issuance and admission.
//!
//! Writes that are bounded by the per-participant limit lock the owning
//! participant row first, so the sum they check cannot change underneath them.

use sqlx::PgPool;
use tracing::info;

use super::data::{CreateTicketRequest, UpdateTicketRequest};
use super::models::Ticket;
use super::rules::ensure_within_cap;
use crate::common::{ApiError, ParticipantId, TicketId};
use crate::domains::participants::actions::get_participant;
use crate::domains::participants::models::Participant;

fn participant_not_found(id: ParticipantId) -> ApiError {
    ApiError::not_found("Participant", "ID", id)
}

fn ticket_not_found(id: TicketId) -> ApiError {
    ApiError::not_found("Ticket", "ID", id)
}

pub async fn create_ticket(request: CreateTicketRequest, pool: &PgPool) -> Result<Ticket, ApiError> {
    let mut tx = pool.begin().await?;

    Participant::lock_for_update(request.participant_id, &mut *tx)
        .await?
        .ok_or_else(|| participant_not_found(request.participant_id))?;

    let held = Ticket::total_quantity(request.participant_id, None, &mut *tx).await?;
    ensure_within_cap(held, request.quantity)?;

    let ticket = Ticket::new(request.participant_id, request.quantity, request.purchased_at)
        .insert(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(
        ticket_id = %ticket.id,
        participant_id = %ticket.participant_id,
        quantity = ticket.quantity,
        "Ticket issued"
    );
    Ok(ticket)
}

pub async fn get_ticket(id: TicketId, pool: &PgPool) -> Result<Ticket, ApiError> {
    Ticket::find_by_id(id, pool)
        .await?
        .ok_or_else(|| ticket_not_found(id))
}

pub async fn list_tickets(pool: &PgPool) -> Result<Vec<Ticket>, ApiError> {
    Ok(Ticket::find_all(pool).await?)
}

pub async fn list_for_participant(
    participant_id: ParticipantId,
    pool: &PgPool,
) -> Result<Vec<Ticket>, ApiError> {
    get_participant(participant_id, pool).await?;
    Ok(Ticket::find_by_participant(participant_id, pool).await?)
}

/// Change owner, quantity or purchase time. The limit is re-checked against
/// the (possibly new) owner, leaving this ticket's old quantity out.
pub async fn update_ticket(
    id: TicketId,
    request: UpdateTicketRequest,
    pool: &PgPool,
) -> Result<Ticket, ApiError> {
    if request.is_empty() {
        return get_ticket(id, pool).await;
    }

    let mut tx = pool.begin().await?;

    // Lock the owner, then re-read: the ticket may have changed in between.
    let current = Ticket::find_by_id(id, &mut *tx)
        .await?
        .ok_or_else(|| ticket_not_found(id))?;
    Participant::lock_for_update(current.participant_id, &mut *tx).await?;

    let mut ticket = Ticket::find_by_id(id, &mut *tx)
        .await?
        .ok_or_else(|| ticket_not_found(id))?;

    let owner = request.participant_id.unwrap_or(ticket.participant_id);
    if owner != ticket.participant_id {
        Participant::lock_for_update(owner, &mut *tx)
            .await?
            .ok_or_else(|| participant_not_found(owner))?;
    }

    let quantity = request.quantity.unwrap_or(ticket.quantity);
    if owner != ticket.participant_id || quantity != ticket.quantity {
        let held = Ticket::total_quantity(owner, Some(id), &mut *tx).await?;
        ensure_within_cap(held, quantity)?;
    }

    ticket.participant_id = owner;
    ticket.quantity = quantity;
    if let Some(purchased_at) = request.purchased_at {
        ticket.purchased_at = purchased_at;
    }

    let ticket = ticket.update(&mut *tx).await?;
    tx.commit().await?;

    info!(ticket_id = %ticket.id, quantity = ticket.quantity, "Ticket updated");
    Ok(ticket)
}

/// Admit a ticket. The flag flips once; a second attempt is rejected.
pub async fn check_in_ticket(id: TicketId, staff: &str, pool: &PgPool) -> Result<Ticket, ApiError> {
    if let Some(ticket) = Ticket::mark_checked_in(id, staff, pool).await? {
        info!(ticket_id = %ticket.id, staff, "Ticket checked in");
        return Ok(ticket);
    }

    match Ticket::find_by_id(id, pool).await? {
        None => Err(ticket_not_found(id)),
        Some(_) => Err(ApiError::BadRequest(
            "Ticket has already been checked in".to_string(),
        )),
    }
}

pub async fn delete_ticket(id: TicketId, pool: &PgPool) -> Result<(), ApiError> {
    if !Ticket::delete(id, pool).await? {
        return Err(ticket_not_found(id));
    }

    info!(ticket_id = %id, "Ticket deleted");
    Ok(())
}
