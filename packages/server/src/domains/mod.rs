// Business domains
pub mod auth;
pub mod checkins;
pub mod participants;
pub mod tickets;
