// Participant domain - the registry of attendees
//
// Responsibilities:
// - Registration with CPF uniqueness
// - Lookup by id, CPF, RA, RF and name
// - Classified and unified search

pub mod actions;
pub mod data;
pub mod models;
pub mod search;

pub use data::*;
pub use models::*;
