use super::{AuthError, Capability};

/// Entry point for authorization checks.
///
/// Authentication has already happened by the time an `Actor` exists; this
/// only answers whether the authenticated user may exercise a capability.
pub struct Actor {
    username: String,
    roles: Vec<String>,
}

impl Actor {
    pub fn new(username: &str, roles: &[String]) -> Self {
        Self {
            username: username.to_string(),
            roles: roles.to_vec(),
        }
    }

    /// Specify what capability the actor needs
    pub fn can(self, capability: Capability) -> CapabilityBuilder {
        CapabilityBuilder {
            actor: self,
            capability,
        }
    }
}

/// Builder after specifying capability
pub struct CapabilityBuilder {
    actor: Actor,
    capability: Capability,
}

impl CapabilityBuilder {
    pub fn check<D>(self, deps: &D) -> Result<(), AuthError>
    where
        D: HasAuthContext + ?Sized,
    {
        if !self.capability.requires_admin() {
            return Ok(());
        }

        let admin_role = deps.admin_role();
        if self.actor.roles.iter().any(|role| role == admin_role) {
            return Ok(());
        }

        tracing::warn!(
            username = %self.actor.username,
            capability = ?self.capability,
            "Authorization denied"
        );
        Err(AuthError::RoleRequired(admin_role.to_string()))
    }
}

/// Anything that knows the role name granting admin capabilities.
pub trait HasAuthContext: Send + Sync {
    fn admin_role(&self) -> &str;
}
