/// Privileged operations guarded by a role check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Remove a participant together with its tickets and check-ins
    DeleteParticipants,

    /// Reach admin-only diagnostic routes
    AccessAdminArea,
}

impl Capability {
    pub fn requires_admin(&self) -> bool {
        match self {
            Capability::DeleteParticipants | Capability::AccessAdminArea => true,
        }
    }
}
