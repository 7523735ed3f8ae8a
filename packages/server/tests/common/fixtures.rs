//! Test fixtures for creating test data.
//!
//! Tests in a binary share one database, so identifiers are randomized.

use anyhow::Result;
use server_core::common::ParticipantId;
use server_core::domains::participants::models::Participant;
use server_core::domains::tickets::models::Ticket;
use sqlx::PgPool;
use uuid::Uuid;

fn random_digits(width: u32) -> String {
    let modulus = 10u128.pow(width);
    format!(
        "{:0width$}",
        Uuid::new_v4().as_u128() % modulus,
        width = width as usize
    )
}

pub fn unique_cpf() -> String {
    random_digits(11)
}

pub fn unique_ra() -> String {
    random_digits(6)
}

pub fn unique_rf() -> String {
    random_digits(4)
}

/// Insert a participant with a fresh CPF.
pub async fn create_participant(pool: &PgPool, name: &str) -> Result<Participant> {
    Participant::new(name.to_string(), unique_cpf(), None, None)
        .insert(pool)
        .await
}

pub async fn create_participant_with_ra(pool: &PgPool, name: &str, ra: &str) -> Result<Participant> {
    Participant::new(name.to_string(), unique_cpf(), Some(ra.to_string()), None)
        .insert(pool)
        .await
}

pub async fn create_ticket(pool: &PgPool, participant_id: ParticipantId, quantity: i32) -> Result<Ticket> {
    Ticket::new(participant_id, quantity, None).insert(pool).await
}
