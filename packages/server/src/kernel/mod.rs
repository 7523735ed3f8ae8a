//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod test_dependencies;
pub mod traits;

pub use deps::{KeycloakAdapter, ServerDeps, TokenValidation};
pub use test_dependencies::{provider_user, MockIdentityProvider};
pub use traits::*;
