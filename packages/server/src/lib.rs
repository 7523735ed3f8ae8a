// Event Check-in API - Core
//
// Backend for admitting participants at an event: a participant registry,
// ticket issuance capped per participant, and an append-only check-in log,
// behind staff authentication against an OpenID Connect provider.
//
// Business logic is organized per-domain in domains/*.

pub mod client;
pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
