//! Auth domain - staff authentication against the identity provider
//!
//! Responsibilities:
//! - Password login, token exchange, refresh and logout
//! - Local session token (JWT) management
//! - The 4-digit staff username policy

pub mod gate;
pub mod jwt;
pub mod payload;
pub mod session;

pub use gate::AuthGate;
pub use jwt::{Claims, JwtService};
pub use payload::{is_valid_username, AuthPayload};
pub use session::{
    ExchangeRequest, LoginRequest, LogoutRequest, RefreshRequest, SessionGrant,
};
