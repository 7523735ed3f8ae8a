// HTTP routes
pub mod auth;
pub mod checkins;
pub mod health;
pub mod participants;
pub mod tickets;

pub use auth::*;
pub use checkins::*;
pub use health::*;
pub use participants::*;
pub use tickets::*;
