use thiserror::Error;

/// Authentication and authorization failures.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Authorization header must use the Bearer scheme")]
    MalformedHeader,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Username must have exactly 4 digits")]
    InvalidUsername,

    #[error("Role '{0}' required")]
    RoleRequired(String),

    #[error("Authentication failed: {0}")]
    CredentialsRejected(String),

    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
