//! Typed ID definitions for the check-in entities.

pub use super::id::Id;

/// Marker type for registered participants.
pub struct Participant;

/// Marker type for purchased tickets.
pub struct Ticket;

/// Marker type for check-in log entries.
pub struct Checkin;

pub type ParticipantId = Id<Participant>;
pub type TicketId = Id<Ticket>;
pub type CheckinId = Id<Checkin>;
