//! Ticket quantity limits.

use crate::common::{ApiError, ValidationErrors};

/// Most tickets, by quantity, one participant may hold.
pub const MAX_TICKETS_PER_PARTICIPANT: i64 = 2;

pub fn validate_quantity(quantity: i32, errors: &mut ValidationErrors) {
    if !(1..=MAX_TICKETS_PER_PARTICIPANT as i32).contains(&quantity) {
        errors.add(
            "quantity",
            format!("quantity must be between 1 and {}", MAX_TICKETS_PER_PARTICIPANT),
        );
    }
}

/// Reject a write that would push a participant over the limit.
///
/// `held` is what the participant holds without the ticket being written.
pub fn ensure_within_cap(held: i64, requested: i32) -> Result<(), ApiError> {
    if held + i64::from(requested) > MAX_TICKETS_PER_PARTICIPANT {
        return Err(ApiError::BadRequest(format!(
            "Participant already holds {} ticket(s); adding {} would exceed the limit of {}",
            held, requested, MAX_TICKETS_PER_PARTICIPANT
        )));
    }
    Ok(())
}
