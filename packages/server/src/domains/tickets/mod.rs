// Ticket domain - issuance capped at two per participant, one-time admission

pub mod actions;
pub mod data;
pub mod models;
pub mod rules;

pub use data::*;
pub use models::*;
pub use rules::MAX_TICKETS_PER_PARTICIPANT;
