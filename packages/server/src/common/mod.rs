// Common types and utilities shared across the application

pub mod auth;
pub mod entity_ids;
pub mod error;
pub mod id;
pub mod validation;

pub use auth::{Actor, AuthError, Capability, HasAuthContext};
pub use entity_ids::*;
pub use error::ApiError;
pub use validation::{FieldError, ValidationErrors};
