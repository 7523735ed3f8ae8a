// Check-in domain - append-only admission log, at most two entries per participant

pub mod actions;
pub mod models;
pub mod rules;

pub use actions::CheckinStatus;
pub use models::*;
pub use rules::MAX_CHECKINS_PER_PARTICIPANT;
