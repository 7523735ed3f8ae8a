/// Authorization checks for request handlers.
///
/// ```rust,ignore
/// use crate::common::auth::{Actor, Capability};
///
/// Actor::new(&user.username, &user.roles)
///     .can(Capability::DeleteParticipants)
///     .check(&state)?;
/// ```
mod builder;
mod capability;
mod errors;

pub use builder::{Actor, CapabilityBuilder, HasAuthContext};
pub use capability::Capability;
pub use errors::AuthError;
